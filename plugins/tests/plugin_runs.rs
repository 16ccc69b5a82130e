use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use fanout_core::orchestrator::traits::TaskHandler;
use fanout_core::orchestrator::types::{
    OrchestratorConfig, RetryConfig, RunStatus, StatusReport, Task,
};
use fanout_core::Orchestrator;
use fanout_plugins::orchestrator::{ExponentialBackoffPlugin, FileReportSink, MemoryReportSink};

struct FlakyHandler {
    fail_ids: HashSet<String>,
    calls: AtomicUsize,
}

#[async_trait]
impl TaskHandler for FlakyHandler {
    async fn execute(&self, task: &Task) -> anyhow::Result<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ids.contains(&task.id) {
            anyhow::bail!("induced failure for {}", task.id);
        }
        Ok(serde_json::Value::Null)
    }
}

fn batch(n: usize) -> Vec<Task> {
    (0..n)
        .map(|i| Task::new(format!("task-{i}"), serde_json::Value::Null))
        .collect()
}

#[tokio::test]
async fn exponential_backoff_exhausts_then_counts_once() {
    // cap=3, 10 tasks, 4 always fail, two retries after the first attempt.
    let handler = Arc::new(FlakyHandler {
        fail_ids: ["task-1", "task-3", "task-6", "task-9"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        calls: AtomicUsize::new(0),
    });

    let config = OrchestratorConfig {
        max_concurrent: 3,
        retry: RetryConfig {
            strategy: "exponential-backoff".to_string(),
            base_delay_ms: 1,
            max_delay_ms: 4,
            max_attempts: 3,
        },
        ..Default::default()
    };
    let retry = Arc::new(ExponentialBackoffPlugin::new(config.retry.clone()));

    let orchestrator = Orchestrator::builder(config, handler.clone())
        .retry_strategy(retry)
        .build();

    let report = orchestrator.run(batch(10)).await.unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.tasks_completed, 6);
    assert_eq!(report.tasks_failed, 4);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 18);
}

#[tokio::test]
async fn file_sink_checkpoints_survive_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");

    let handler = Arc::new(FlakyHandler {
        fail_ids: HashSet::new(),
        calls: AtomicUsize::new(0),
    });
    let config = OrchestratorConfig {
        max_concurrent: 4,
        iterations: 3,
        checkpoint_interval: 1,
        ..Default::default()
    };

    let orchestrator = Orchestrator::builder(config, handler)
        .report_sink(Arc::new(FileReportSink::new(&path)))
        .build();

    let report = orchestrator.run(batch(8)).await.unwrap();
    assert_eq!(report.status, RunStatus::Completed);

    // The file always holds the most recent complete snapshot.
    let raw = std::fs::read_to_string(&path).unwrap();
    let persisted: StatusReport = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted.status, RunStatus::Completed);
    assert_eq!(persisted.tasks_total, 24);
    assert_eq!(persisted.tasks_completed, 24);
    assert_eq!(persisted.run_id, report.run_id);
}

#[tokio::test]
async fn memory_sink_sees_every_checkpoint() {
    let sink = Arc::new(MemoryReportSink::new());
    let handler = Arc::new(FlakyHandler {
        fail_ids: HashSet::new(),
        calls: AtomicUsize::new(0),
    });
    let config = OrchestratorConfig {
        max_concurrent: 2,
        iterations: 3,
        checkpoint_interval: 1,
        ..Default::default()
    };

    let orchestrator = Orchestrator::builder(config, handler)
        .report_sink(sink.clone())
        .build();

    orchestrator.run(batch(5)).await.unwrap();

    let reports = sink.reports();
    assert_eq!(reports.len(), 3);
    assert!(reports
        .windows(2)
        .all(|pair| pair[0].tasks_total <= pair[1].tasks_total));
    assert_eq!(reports.last().unwrap().tasks_total, 15);
}
