use thiserror::Error;

use super::report::ReportError;

/// Orchestrator-specific errors for batch validation and run execution
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Empty task batch")]
    EmptyBatch,

    #[error("Duplicate task ID: {0}")]
    DuplicateTaskId(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Concurrency gate closed unexpectedly")]
    GateClosed,

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}
