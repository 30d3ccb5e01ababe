//! Batch orchestration
//!
//! Runs the record builder over many paths on a bounded worker pool.
//! Every path ends up either counted as processed or listed as an error
//! in the [`BatchReport`]; a failing file never stops the batch.

mod progress;

pub use progress::{FileStage, ProgressEvent};

use crate::api::{DicomRecord, RecordBuilder};
use crate::error::{DicomscanError, Result};
use crate::types::{BatchConfig, BatchReport};
use crossbeam_channel::{RecvTimeoutError, Sender};
use log::{info, warn};
use progress::StageTracker;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Instant;

/// Records and report of a finished batch
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub report: BatchReport,
    /// Successful records in completion order
    pub records: Vec<DicomRecord>,
}

/// Drives the record builder over a list of paths
///
/// # Example
///
/// ```
/// use dicomscan_core::{BatchConfig, BatchProcessor};
/// use std::path::PathBuf;
///
/// let processor = BatchProcessor::new(BatchConfig::sequential());
/// let output = processor
///     .run(&[PathBuf::from("/nonexistent/scan.dcm")])
///     .unwrap();
///
/// assert_eq!(output.report.total_files, 1);
/// assert_eq!(output.report.errors.len(), 1);
/// assert!(output.records.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    config: BatchConfig,
    builder: RecordBuilder,
}

impl BatchProcessor {
    pub fn new(config: BatchConfig) -> Self {
        let builder = RecordBuilder::new(config.record);
        Self { config, builder }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Processes every path and collects the successful records
    ///
    /// # Errors
    ///
    /// Returns [`DicomscanError::ThreadPool`] if the worker pool cannot be
    /// created. Per-file failures only show up in the report.
    pub fn run(&self, paths: &[PathBuf]) -> Result<BatchOutput> {
        let records = Mutex::new(Vec::new());
        let report = self.process(paths, None, |record| {
            records
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(record);
        })?;
        let records = records.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(BatchOutput { report, records })
    }

    /// Processes every path, handing each record to `sink` as it completes
    ///
    /// One [`ProgressEvent`] per path is sent on `progress` when the path
    /// reaches [`FileStage::Done`] or [`FileStage::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`DicomscanError::ThreadPool`] if the worker pool cannot be
    /// created.
    pub fn process<F>(
        &self,
        paths: &[PathBuf],
        progress: Option<&Sender<ProgressEvent>>,
        sink: F,
    ) -> Result<BatchReport>
    where
        F: Fn(DicomRecord) + Sync,
    {
        let started = Instant::now();
        let report = Mutex::new(BatchReport::new(paths.len()));

        let visit = |path: &PathBuf| {
            let outcome = self.process_path(path);
            let stage = match outcome {
                Ok(record) => {
                    sink(record);
                    report
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .record_success();
                    FileStage::Done
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", path.display(), e);
                    report
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .record_failure(path.clone(), e.to_string());
                    FileStage::Failed
                }
            };
            if let Some(tx) = progress {
                // a dropped receiver only stops progress reporting
                let _ = tx.send(ProgressEvent {
                    path: path.clone(),
                    stage,
                });
            }
        };

        if self.config.concurrency <= 1 {
            paths.iter().for_each(visit);
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.concurrency)
                .thread_name(|i| format!("dicomscan-worker-{}", i))
                .build()?;
            pool.install(|| paths.par_iter().for_each(visit));
        }

        let report = report.into_inner().unwrap_or_else(PoisonError::into_inner);
        info!(
            "Processed {}/{} files in {:.2?} ({} failed)",
            report.processed_count,
            report.total_files,
            started.elapsed(),
            report.errors.len()
        );
        Ok(report)
    }

    /// Builds one record, under the per-file timeout if one is set
    fn process_path(&self, path: &Path) -> Result<DicomRecord> {
        let limit = match self.config.timeout {
            Some(limit) => limit,
            None => return build_record(self.builder, path),
        };

        let (tx, rx) = crossbeam_channel::bounded(1);
        let builder = self.builder;
        let owned = path.to_path_buf();
        thread::Builder::new()
            .name("dicomscan-file".to_string())
            .spawn(move || {
                let _ = tx.send(build_record(builder, &owned));
            })?;

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(DicomscanError::Timeout(limit)),
            Err(RecvTimeoutError::Disconnected) => Err(DicomscanError::ThreadPool(format!(
                "worker for {} exited without a result",
                path.display()
            ))),
        }
    }
}

/// Builds one record, turning a panic inside the decoders into a file error
fn build_record(builder: RecordBuilder, path: &Path) -> Result<DicomRecord> {
    let mut tracker = StageTracker::new(path);
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        builder.read_staged(path, |stage| tracker.enter(stage))
    }))
    .unwrap_or_else(|payload| Err(DicomscanError::Panic(panic_message(payload.as_ref()))));

    if let Err(e) = &result {
        tracker.fail(e);
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
