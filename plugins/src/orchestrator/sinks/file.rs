use std::io::Write;
use std::path::{Path, PathBuf};

use fanout_core::error::ReportError;
use fanout_core::orchestrator::traits::ReportSink;
use fanout_core::orchestrator::types::StatusReport;
use tempfile::NamedTempFile;

/// Persists status reports as pretty-printed JSON, atomically.
///
/// The report is written to a temp file in the destination directory and
/// renamed over the target, so a reader never observes a partial report.
pub struct FileReportSink {
    path: PathBuf,
}

impl FileReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for FileReportSink {
    fn name(&self) -> &str {
        "file"
    }

    fn persist(&self, report: &StatusReport) -> Result<(), ReportError> {
        let bytes = serde_json::to_vec_pretty(report)?;

        // Temp file must live in the destination directory so the rename
        // stays on one filesystem.
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| ReportError::Io(e.error))?;

        Ok(())
    }
}
