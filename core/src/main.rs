use clap::Parser;
use dicomscan_core::cli::discovery::collect_files;
use dicomscan_core::cli::{Cli, Command, OutputFormat, ReadArgs};
use dicomscan_core::{
    BatchProcessor, BatchReport, DicomRecord, FileStage, ProgressEvent, TextReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::process;
use std::sync::Mutex;
use std::thread;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Read(args) => read(args),
    }
}

fn read(args: ReadArgs) {
    setup_logging(args.verbose);

    if !args.path.is_dir() {
        eprintln!("Error: {} is not a directory", args.path.display());
        process::exit(1);
    }

    let config = args.batch_config();
    info!("Processing files in: {}", args.path.display());
    info!(
        "CPU cores detected: {}, using {} worker threads",
        num_cpus::get(),
        config.concurrency
    );

    let paths = collect_files(&args.path);
    info!("Found {} files to process", paths.len());

    let (tx, rx) = crossbeam_channel::unbounded::<ProgressEvent>();
    let progress_bar = ProgressBar::new(paths.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        progress_bar.set_style(style.progress_chars("#>-"));
    }

    let bar = progress_bar.clone();
    let progress_thread = thread::spawn(move || {
        let mut failed = 0usize;
        for event in rx {
            if event.stage == FileStage::Failed {
                failed += 1;
                bar.set_message(format!("{} failed", failed));
            }
            bar.inc(1);
        }
    });

    let summaries = Mutex::new(Vec::new());
    let collect_summaries = matches!(args.format, OutputFormat::Json);
    let processor = BatchProcessor::new(config);
    let result = processor.process(&paths, Some(&tx), |record| {
        if collect_summaries {
            if let Ok(mut summaries) = summaries.lock() {
                summaries.push(RecordSummary::from(record));
            }
        }
    });

    drop(tx);
    if progress_thread.join().is_err() {
        error!("Progress reporting thread panicked");
    }
    progress_bar.finish_with_message("Processing complete!");

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("Batch failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let summaries = summaries.into_inner().unwrap_or_default();
    output_report(&report, summaries, args.format);

    if !report.is_success() {
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

/// Per-file output without the pixel samples
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(not(feature = "json"), allow(dead_code))]
struct RecordSummary {
    path: String,
    tags: dicomscan_core::ExtractedTags,
    pixel_shape: Option<Vec<usize>>,
}

impl From<DicomRecord> for RecordSummary {
    fn from(record: DicomRecord) -> Self {
        Self {
            path: record.path.display().to_string(),
            pixel_shape: record.pixel_shape().map(<[usize]>::to_vec),
            tags: record.tags,
        }
    }
}

fn output_report(report: &BatchReport, records: Vec<RecordSummary>, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("{}", TextReport::new(report));
        }
        OutputFormat::Json => {
            #[cfg(feature = "json")]
            {
                match output_json(report, records) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize to JSON: {}", e);
                        eprintln!("Error: Failed to serialize to JSON: {}", e);
                        process::exit(1);
                    }
                }
            }
            #[cfg(not(feature = "json"))]
            {
                let _ = records;
                eprintln!("Error: JSON output requires the 'json' feature");
                eprintln!("Rebuild with: cargo build --features json");
                process::exit(1);
            }
        }
    }
}

#[cfg(feature = "json")]
fn output_json(
    report: &BatchReport,
    records: Vec<RecordSummary>,
) -> Result<String, serde_json::Error> {
    #[derive(serde::Serialize)]
    struct BatchJson<'a> {
        report: &'a BatchReport,
        records: Vec<RecordSummary>,
    }

    serde_json::to_string_pretty(&BatchJson { report, records })
}
