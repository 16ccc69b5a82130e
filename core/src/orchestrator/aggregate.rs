use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Local;

use crate::orchestrator::types::{
    CategoryTotals, IterationRecord, RunStatus, StatusReport, TaskOutcome,
};

struct IterationInProgress {
    iteration: u32,
    tasks_total: usize,
    completed: usize,
    failed: usize,
    started: Instant,
    started_at: String,
}

/// Accumulates per-task outcomes into iteration and overall totals.
///
/// The aggregator is the single shared mutable sink of a run (behind a
/// mutex); nothing else mutates outcomes. After `finalize` it is frozen and
/// further recording is a contract violation.
pub struct RunAggregator {
    run_id: String,
    total_agents: usize,
    iterations_cfg: u32,
    tasks_per_iteration: usize,
    tasks_completed: usize,
    tasks_failed: usize,
    per_category: BTreeMap<String, CategoryTotals>,
    records: Vec<IterationRecord>,
    current: Option<IterationInProgress>,
    peak_concurrency: usize,
    run_started: Instant,
    status: RunStatus,
    finalized: bool,
}

impl RunAggregator {
    pub fn new(
        run_id: impl Into<String>,
        total_agents: usize,
        iterations: u32,
        tasks_per_iteration: usize,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            total_agents,
            iterations_cfg: iterations,
            tasks_per_iteration,
            tasks_completed: 0,
            tasks_failed: 0,
            per_category: BTreeMap::new(),
            records: Vec::new(),
            current: None,
            peak_concurrency: 0,
            run_started: Instant::now(),
            status: RunStatus::InProgress,
            finalized: false,
        }
    }

    pub fn start_iteration(&mut self, iteration: u32, tasks_total: usize) {
        debug_assert!(self.current.is_none(), "previous iteration not finished");
        self.current = Some(IterationInProgress {
            iteration,
            tasks_total,
            completed: 0,
            failed: 0,
            started: Instant::now(),
            started_at: Local::now().to_rfc3339(),
        });
    }

    /// Record the final outcome of one task. Exactly one call per task.
    pub fn record(&mut self, outcome: &TaskOutcome) {
        debug_assert!(!self.finalized, "record after finalize");

        let current = self
            .current
            .as_mut()
            .expect("task outcome recorded outside an iteration");

        let entry = self.per_category.entry(outcome.category.clone()).or_default();
        if outcome.status.is_success() {
            current.completed += 1;
            self.tasks_completed += 1;
            entry.completed += 1;
        } else {
            current.failed += 1;
            self.tasks_failed += 1;
            entry.failed += 1;
        }
    }

    /// Close the current iteration and append its record.
    ///
    /// `drained` is false when the pass was cut short by cancellation, in
    /// which case the processed count may fall short of the planned total.
    pub fn finish_iteration(&mut self, drained: bool) -> IterationRecord {
        let current = self
            .current
            .take()
            .expect("finish_iteration without start_iteration");

        let processed = current.completed + current.failed;
        if drained {
            assert_eq!(
                processed, current.tasks_total,
                "iteration drained but task outcomes are missing"
            );
        }

        let secs = current.started.elapsed().as_secs_f64();
        let throughput = if secs > 0.0 {
            processed as f64 / secs
        } else {
            0.0
        };

        let record = IterationRecord {
            iteration: current.iteration,
            tasks_total: current.tasks_total,
            tasks_completed: current.completed,
            tasks_failed: current.failed,
            throughput,
            started_at: current.started_at,
            completed_at: Some(Local::now().to_rfc3339()),
        };
        self.records.push(record.clone());
        record
    }

    /// Fold a pass's observed gate peak into the run-wide high-water mark
    pub fn observe_peak(&mut self, peak: usize) {
        self.peak_concurrency = self.peak_concurrency.max(peak);
    }

    pub fn iterations_run(&self) -> u32 {
        self.records.len() as u32
    }

    /// Immutable report computed from current totals
    pub fn snapshot(&self) -> StatusReport {
        let tasks_total = self.tasks_completed + self.tasks_failed;
        let planned = self.iterations_cfg as usize * self.tasks_per_iteration;
        let completion_percentage = if planned > 0 {
            tasks_total as f64 / planned as f64 * 100.0
        } else {
            0.0
        };

        let secs = self.run_started.elapsed().as_secs_f64();
        let throughput = if secs > 0.0 {
            tasks_total as f64 / secs
        } else {
            0.0
        };

        StatusReport {
            run_id: self.run_id.clone(),
            status: self.status,
            total_agents: self.total_agents,
            iterations: self.iterations_cfg,
            iterations_run: self.iterations_run(),
            tasks_per_iteration: self.tasks_per_iteration,
            tasks_total,
            tasks_completed: self.tasks_completed,
            tasks_failed: self.tasks_failed,
            completion_percentage,
            peak_concurrency: self.peak_concurrency,
            throughput,
            per_category: self.per_category.clone(),
            iteration_records: self.records.clone(),
            generated_at: Local::now().to_rfc3339(),
        }
    }

    /// Produce the terminal report and freeze further mutation
    pub fn finalize(&mut self, status: RunStatus) -> StatusReport {
        debug_assert!(!self.finalized, "finalize called twice");
        self.status = status;
        self.finalized = true;
        self.snapshot()
    }
}
