use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fanout_core::error::ReportError;
use fanout_core::orchestrator::traits::{
    OutputRendererPlugin, RenderEvent, ReportSink, RetryStrategyPlugin, TaskHandler,
};
use fanout_core::orchestrator::types::{StatusReport, Task, TaskOutcome};

pub fn batch(n: usize) -> Vec<Task> {
    (0..n)
        .map(|i| Task::new(format!("task-{i}"), serde_json::Value::Null))
        .collect()
}

/// Handler that succeeds immediately and counts invocations.
#[derive(Default)]
pub struct InstantHandler {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TaskHandler for InstantHandler {
    async fn execute(&self, _task: &Task) -> anyhow::Result<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::Value::Null)
    }
}

/// Handler that always fails for a fixed set of task ids.
pub struct SelectiveFailHandler {
    fail_ids: HashSet<String>,
    pub calls: AtomicUsize,
}

impl SelectiveFailHandler {
    pub fn new(fail_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            fail_ids: fail_ids.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TaskHandler for SelectiveFailHandler {
    async fn execute(&self, task: &Task) -> anyhow::Result<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ids.contains(&task.id) {
            anyhow::bail!("induced failure for {}", task.id);
        }
        Ok(serde_json::Value::Null)
    }
}

/// Handler that sleeps briefly and tracks how many executions overlap.
pub struct ProbeHandler {
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    delay: Duration,
}

impl ProbeHandler {
    pub fn new(delay: Duration) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay,
        }
    }
}

#[async_trait]
impl TaskHandler for ProbeHandler {
    async fn execute(&self, _task: &Task) -> anyhow::Result<serde_json::Value> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(serde_json::Value::Null)
    }
}

/// Retry strategy with zero delay, for fast deterministic retry tests.
pub struct ImmediateRetry {
    pub attempts: u32,
}

impl RetryStrategyPlugin for ImmediateRetry {
    fn name(&self) -> &str {
        "immediate"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Option<Duration> {
        (attempt < self.attempts).then_some(Duration::ZERO)
    }

    fn max_attempts(&self) -> u32 {
        self.attempts
    }
}

/// Sink recording every persisted report, in order.
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<StatusReport>>,
}

impl RecordingSink {
    pub fn reports(&self) -> Vec<StatusReport> {
        self.reports.lock().unwrap().clone()
    }
}

impl ReportSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn persist(&self, report: &StatusReport) -> Result<(), ReportError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

/// Renderer capturing final task outcomes, for asserting status and attempts.
#[derive(Default)]
pub struct CapturingRenderer {
    outcomes: Mutex<Vec<TaskOutcome>>,
}

impl CapturingRenderer {
    pub fn outcomes(&self) -> Vec<TaskOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl OutputRendererPlugin for CapturingRenderer {
    fn name(&self) -> &str {
        "capture"
    }

    fn format(&self) -> &str {
        "none"
    }

    fn render(&self, event: &RenderEvent) {
        if let RenderEvent::TaskComplete { outcome, .. } = event {
            self.outcomes.lock().unwrap().push(outcome.clone());
        }
    }
}
