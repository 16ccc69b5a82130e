use thiserror::Error;

/// Errors raised while serializing or persisting a status report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to persist report: {0}")]
    Io(#[from] std::io::Error),
}
