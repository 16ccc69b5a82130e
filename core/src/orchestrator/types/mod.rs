mod config;
mod result;
mod task;

pub use config::{
    ConcurrencyConfig, OrchestratorConfig, OutputOpts, RetryConfig, DEFAULT_TASK_TIMEOUT_SECS,
    MAX_TASK_TIMEOUT_SECS,
};
pub use result::{
    CategoryTotals, IterationRecord, RunStatus, StatusReport, TaskOutcome, TaskStatus,
};
pub use task::Task;
