use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Terminal state of one task attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Failure,
    TimedOut,
    /// Failure after exhausting all configured retry attempts
    FailedFinal,
}

impl TaskStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success)
    }
}

/// Final outcome of executing a single task
///
/// A retried task produces one outcome per attempt internally; only the
/// outcome of the last attempt is recorded in the aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Task identifier
    pub task_id: String,

    /// Category label carried over from the task, for per-category totals
    pub category: String,

    /// Terminal status of the last attempt
    pub status: TaskStatus,

    /// Error message (present iff status is not Success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock duration across all attempts, in milliseconds
    pub duration_ms: u64,

    /// RFC3339 timestamp of when the outcome was determined
    pub completed_at: String,

    /// Number of attempts used (1 = no retries)
    pub attempts: u32,
}

/// Summary of one full pass over the task batch
///
/// For a drained pass `tasks_completed + tasks_failed == tasks_total`. A
/// pass cut short by cancellation keeps the planned count in `tasks_total`
/// while the processed count falls short, exposing the shortfall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based iteration number
    pub iteration: u32,

    /// Number of tasks planned for this pass
    pub tasks_total: usize,

    /// Number of tasks that reached Success
    pub tasks_completed: usize,

    /// Number of tasks that reached a terminal failure state
    pub tasks_failed: usize,

    /// Tasks per second over the pass
    pub throughput: f64,

    pub started_at: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl IterationRecord {
    /// Fraction of processed tasks that failed, in 0.0..=1.0
    pub fn failure_rate(&self) -> f64 {
        let processed = self.tasks_completed + self.tasks_failed;
        if processed == 0 {
            return 0.0;
        }
        self.tasks_failed as f64 / processed as f64
    }
}

/// Overall state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Completed,
    /// Failure-rate threshold exceeded; remaining iterations were skipped
    Aborted,
    /// External cancellation signal received
    Cancelled,
}

/// Success/failure totals for one task category
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub completed: usize,
    pub failed: usize,
}

/// Aggregate progress report across all iterations of a run
///
/// `tasks_total` counts tasks that reached a terminal state, so
/// `tasks_completed + tasks_failed == tasks_total` holds at every snapshot.
/// `completion_percentage` is measured against the planned workload
/// (`iterations * tasks_per_iteration`) and only reaches 100 when every
/// planned task was processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub run_id: String,

    pub status: RunStatus,

    /// Configured concurrency cap ("max concurrent agents")
    pub total_agents: usize,

    /// Configured number of iterations
    pub iterations: u32,

    /// Iterations that actually ran to their end
    pub iterations_run: u32,

    /// Batch size of the first pass
    pub tasks_per_iteration: usize,

    /// Tasks that reached a terminal state so far
    pub tasks_total: usize,

    pub tasks_completed: usize,

    pub tasks_failed: usize,

    /// Processed share of the planned workload, 0.0..=100.0
    pub completion_percentage: f64,

    /// Highest number of concurrently in-flight tasks observed
    pub peak_concurrency: usize,

    /// Average tasks per second across the whole run
    pub throughput: f64,

    /// Per-category completed/failed totals
    pub per_category: BTreeMap<String, CategoryTotals>,

    pub iteration_records: Vec<IterationRecord>,

    pub generated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_rate_of_empty_record_is_zero() {
        let record = IterationRecord {
            iteration: 1,
            tasks_total: 0,
            tasks_completed: 0,
            tasks_failed: 0,
            throughput: 0.0,
            started_at: String::new(),
            completed_at: None,
        };
        assert_eq!(record.failure_rate(), 0.0);
    }

    #[test]
    fn failure_rate_counts_processed_tasks() {
        let record = IterationRecord {
            iteration: 1,
            tasks_total: 10,
            tasks_completed: 4,
            tasks_failed: 6,
            throughput: 0.0,
            started_at: String::new(),
            completed_at: None,
        };
        assert!((record.failure_rate() - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn task_status_serializes_snake_case() {
        let s = serde_json::to_string(&TaskStatus::TimedOut).unwrap();
        assert_eq!(s, "\"timed_out\"");
        let s = serde_json::to_string(&TaskStatus::FailedFinal).unwrap();
        assert_eq!(s, "\"failed_final\"");
    }
}
