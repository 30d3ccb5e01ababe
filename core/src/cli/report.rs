use crate::types::BatchReport;
use std::fmt;

/// Text report formatter for a batch run
pub struct TextReport<'a> {
    report: &'a BatchReport,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(report: &'a BatchReport) -> Self {
        Self { report }
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch Summary")?;
        writeln!(f, "=============")?;
        writeln!(f)?;
        writeln!(f, "Total files:    {}", self.report.total_files)?;
        writeln!(f, "Processed:      {}", self.report.processed_count)?;
        writeln!(f, "Failed:         {}", self.report.errors.len())?;

        if self.report.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "All files processed successfully")?;
            return Ok(());
        }

        writeln!(f)?;
        writeln!(f, "Errors")?;
        writeln!(f, "------")?;
        for error in &self.report.errors {
            writeln!(f, "{}: {}", error.path.display(), error.message)?;
        }
        Ok(())
    }
}
