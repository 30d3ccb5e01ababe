use std::path::PathBuf;

/// A file that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a batch run
///
/// `processed_count + errors.len() == total_files` holds once every
/// path has been visited. Errors are kept in completion order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct BatchReport {
    pub total_files: usize,
    pub processed_count: usize,
    pub errors: Vec<FileError>,
}

impl BatchReport {
    /// Creates an empty report for a batch of `total_files` paths
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            processed_count: 0,
            errors: Vec::new(),
        }
    }

    /// Counts one successfully processed file
    pub fn record_success(&mut self) {
        self.processed_count += 1;
    }

    /// Appends a failed file
    pub fn record_failure(&mut self, path: PathBuf, message: impl Into<String>) {
        self.errors.push(FileError {
            path,
            message: message.into(),
        });
    }

    /// Number of files visited so far
    pub fn visited(&self) -> usize {
        self.processed_count + self.errors.len()
    }

    /// Whether every path has been visited
    pub fn is_complete(&self) -> bool {
        self.visited() == self.total_files
    }

    /// Whether the batch finished without failures
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
