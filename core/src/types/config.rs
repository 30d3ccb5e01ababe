use std::time::Duration;

/// What to do when pixel data cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "kebab-case"))]
pub enum PixelErrorPolicy {
    /// Any pixel decoding error fails the whole file
    #[default]
    Fail,
    /// Recoverable errors (unsupported compression) yield a record
    /// without pixel data; all others still fail the file
    Degrade,
}

/// Modality LUT handling for decoded samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "kebab-case"))]
pub enum ModalityLut {
    /// Keep stored values as they are
    #[default]
    None,
    /// Apply Rescale Slope and Rescale Intercept to single-sample images
    Rescale,
}

/// Options for building one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordOptions {
    pub pixel_policy: PixelErrorPolicy,
    pub modality_lut: ModalityLut,
}

/// Configuration for a batch run
///
/// # Example
///
/// ```
/// use dicomscan_core::{BatchConfig, PixelErrorPolicy};
/// use std::time::Duration;
///
/// let config = BatchConfig::default()
///     .with_concurrency(4)
///     .with_timeout(Duration::from_secs(30))
///     .with_pixel_policy(PixelErrorPolicy::Degrade);
///
/// assert_eq!(config.concurrency, 4);
/// assert_eq!(config.timeout, Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchConfig {
    /// Number of worker threads; 1 processes files on the calling thread
    pub concurrency: usize,

    /// Per-file time limit
    pub timeout: Option<Duration>,

    /// Options forwarded to the record builder
    pub record: RecordOptions,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout: None,
            record: RecordOptions::default(),
        }
    }
}

impl BatchConfig {
    /// Creates a single-threaded configuration
    pub fn sequential() -> Self {
        Self {
            concurrency: 1,
            ..Self::default()
        }
    }

    /// Builder: Set the number of workers (clamped to at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Builder: Set the per-file timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builder: Set the pixel error policy
    pub fn with_pixel_policy(mut self, policy: PixelErrorPolicy) -> Self {
        self.record.pixel_policy = policy;
        self
    }

    /// Builder: Set modality LUT handling
    pub fn with_modality_lut(mut self, lut: ModalityLut) -> Self {
        self.record.modality_lut = lut;
        self
    }
}

/// One less than the number of cores, never below one
pub fn default_concurrency() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}
