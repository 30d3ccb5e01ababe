use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a file is in its processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum FileStage {
    Pending,
    Parsed,
    Extracted,
    Done,
    Failed,
}

impl FileStage {
    /// Whether the file has left the pipeline
    pub fn is_terminal(self) -> bool {
        matches!(self, FileStage::Done | FileStage::Failed)
    }

    /// Following stage on success, `None` once terminal
    pub fn next(self) -> Option<FileStage> {
        match self {
            FileStage::Pending => Some(FileStage::Parsed),
            FileStage::Parsed => Some(FileStage::Extracted),
            FileStage::Extracted => Some(FileStage::Done),
            FileStage::Done | FileStage::Failed => None,
        }
    }
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStage::Pending => "pending",
            FileStage::Parsed => "parsed",
            FileStage::Extracted => "extracted",
            FileStage::Done => "done",
            FileStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Sent once per path when it reaches a terminal stage
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ProgressEvent {
    pub path: PathBuf,
    pub stage: FileStage,
}

/// Stage of one file as it moves through the pipeline
#[derive(Debug)]
pub(crate) struct StageTracker<'a> {
    path: &'a Path,
    stage: FileStage,
}

impl<'a> StageTracker<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self {
            path,
            stage: FileStage::Pending,
        }
    }

    /// Records that the file completed `stage`
    pub fn enter(&mut self, stage: FileStage) {
        debug!("{}: {} -> {}", self.path.display(), self.stage, stage);
        self.stage = stage;
    }

    /// Moves to [`FileStage::Failed`] from wherever the file stopped
    pub fn fail(&mut self, error: &dyn fmt::Display) {
        debug!(
            "{}: {} -> {}: {}",
            self.path.display(),
            self.stage,
            FileStage::Failed,
            error
        );
        self.stage = FileStage::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stage = FileStage::Pending;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            stage = next;
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                FileStage::Pending,
                FileStage::Parsed,
                FileStage::Extracted,
                FileStage::Done
            ]
        );
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_failed_is_terminal() {
        assert!(FileStage::Failed.is_terminal());
        assert_eq!(FileStage::Failed.next(), None);
        assert!(!FileStage::Parsed.is_terminal());
    }

    #[test]
    fn test_tracker_records_failure_stage() {
        let path = Path::new("a.dcm");
        let mut tracker = StageTracker::new(path);
        tracker.enter(FileStage::Parsed);
        assert_eq!(tracker.stage, FileStage::Parsed);
        tracker.fail(&"bad pixel data");
        assert_eq!(tracker.stage, FileStage::Failed);
    }
}
