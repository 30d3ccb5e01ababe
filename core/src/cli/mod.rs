pub mod discovery;
pub mod report;

use crate::types::{BatchConfig, ModalityLut, PixelErrorPolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for dicomscan
#[derive(Parser, Debug)]
#[command(name = "dicomscan")]
#[command(about = "Batch DICOM metadata and pixel data reader")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read every file under a directory
    Read(ReadArgs),
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Directory to scan for files
    #[arg(short, long, value_name = "DIR")]
    pub path: PathBuf,

    /// Number of worker threads (defaults to CPU cores - 1)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Per-file time limit in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Keep files whose pixel compression is unsupported, without pixel data
    #[arg(long)]
    pub degrade_unsupported_pixels: bool,

    /// Apply Rescale Slope/Intercept to decoded samples
    #[arg(long)]
    pub rescale: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ReadArgs {
    /// Batch configuration described by the flags
    pub fn batch_config(&self) -> BatchConfig {
        let mut config = BatchConfig::default();
        if let Some(threads) = self.threads {
            config = config.with_concurrency(threads);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if self.degrade_unsupported_pixels {
            config = config.with_pixel_policy(PixelErrorPolicy::Degrade);
        }
        if self.rescale {
            config = config.with_modality_lut(ModalityLut::Rescale);
        }
        config
    }
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ReadArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Read(args) => args,
        }
    }

    #[test]
    fn test_read_defaults() {
        let args = parse(&["dicomscan", "read", "--path", "/data"]);
        assert_eq!(args.path, PathBuf::from("/data"));
        let config = args.batch_config();
        assert_eq!(config, BatchConfig::default());
    }

    #[test]
    fn test_read_flags() {
        let args = parse(&[
            "dicomscan",
            "read",
            "-p",
            "/data",
            "-t",
            "3",
            "--timeout-secs",
            "10",
            "--degrade-unsupported-pixels",
            "--rescale",
        ]);
        let config = args.batch_config();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.record.pixel_policy, PixelErrorPolicy::Degrade);
        assert_eq!(config.record.modality_lut, ModalityLut::Rescale);
    }

    #[test]
    fn test_path_is_required() {
        assert!(Cli::try_parse_from(["dicomscan", "read"]).is_err());
    }
}
