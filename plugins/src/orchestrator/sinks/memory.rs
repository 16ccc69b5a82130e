use std::sync::Mutex;

use fanout_core::error::ReportError;
use fanout_core::orchestrator::traits::ReportSink;
use fanout_core::orchestrator::types::StatusReport;

/// In-memory sink keeping every persisted report, for tests and embedding
#[derive(Default)]
pub struct MemoryReportSink {
    reports: Mutex<Vec<StatusReport>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports persisted so far, in order
    pub fn reports(&self) -> Vec<StatusReport> {
        match self.reports.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<StatusReport> {
        self.reports().pop()
    }
}

impl ReportSink for MemoryReportSink {
    fn name(&self) -> &str {
        "memory"
    }

    fn persist(&self, report: &StatusReport) -> Result<(), ReportError> {
        match self.reports.lock() {
            Ok(mut guard) => guard.push(report.clone()),
            Err(poisoned) => poisoned.into_inner().push(report.clone()),
        }
        Ok(())
    }
}
