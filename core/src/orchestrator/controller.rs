use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::OrchestratorError;

use super::aggregate::RunAggregator;
use super::dispatcher::{dispatch_shard, lock_unpoisoned, DispatchContext};
use super::gate::ConcurrencyGate;
use super::output;
use super::progress::ProgressMonitor;
use super::shard::build_shards;
use super::traits::{
    ConcurrencyContext, ConcurrencyStrategyPlugin, OutputRendererPlugin, RenderEvent, ReportSink,
    RetryStrategyPlugin, TaskHandler,
};
use super::types::{IterationRecord, OrchestratorConfig, OutputOpts, RunStatus, StatusReport, Task};

/// Iteration controller driving gate-bounded passes over a task batch.
///
/// Runs the configured number of iterations, checkpoints cumulative progress
/// at the configured interval, aborts early when an iteration's failure rate
/// exceeds the threshold, and honors external cancellation.
pub struct Orchestrator {
    config: OrchestratorConfig,
    handler: Arc<dyn TaskHandler>,
    retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
    concurrency_strategy: Option<Arc<dyn ConcurrencyStrategyPlugin>>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    sink: Option<Arc<dyn ReportSink>>,
    opts: OutputOpts,
    cancel: CancellationToken,
}

pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    handler: Arc<dyn TaskHandler>,
    retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
    concurrency_strategy: Option<Arc<dyn ConcurrencyStrategyPlugin>>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    sink: Option<Arc<dyn ReportSink>>,
    opts: OutputOpts,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, handler: Arc<dyn TaskHandler>) -> Self {
        Self::builder(config, handler).build()
    }

    pub fn builder(config: OrchestratorConfig, handler: Arc<dyn TaskHandler>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config, handler)
    }

    /// Token callers can use to cancel the run externally
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run all iterations over one batch, reusing it for every pass.
    pub async fn run(&self, tasks: Vec<Task>) -> Result<StatusReport, OrchestratorError> {
        self.run_with(move |_| tasks.clone()).await
    }

    /// Run all iterations, regenerating the batch for each pass.
    ///
    /// `make_batch` is called once per iteration with the 1-based iteration
    /// number. The first batch defines `tasks_per_iteration` for reporting.
    pub async fn run_with<F>(&self, mut make_batch: F) -> Result<StatusReport, OrchestratorError>
    where
        F: FnMut(u32) -> Vec<Task>,
    {
        self.config.validate()?;

        let first_batch = make_batch(1);
        if first_batch.is_empty() {
            return Err(OrchestratorError::EmptyBatch);
        }

        let run_id = Uuid::new_v4().to_string();
        let tasks_per_iteration = first_batch.len();
        let iterations = self.config.iterations;

        tracing::info!(
            run_id = %run_id,
            iterations,
            tasks_per_iteration,
            max_concurrent = self.config.max_concurrent,
            "starting orchestrator run"
        );

        let aggregator = Arc::new(Mutex::new(RunAggregator::new(
            &run_id,
            self.config.max_concurrent,
            iterations,
            tasks_per_iteration,
        )));
        let progress = Arc::new(Mutex::new(ProgressMonitor::new(
            iterations as usize * tasks_per_iteration,
            self.opts.progress_bar,
        )));

        self.emit_run_start(&run_id, tasks_per_iteration);

        let mut status = RunStatus::Completed;
        let mut first_batch = Some(first_batch);

        for iteration in 1..=iterations {
            let tasks = match first_batch.take() {
                Some(batch) => batch,
                None => make_batch(iteration),
            };

            let cap = self.effective_cap(tasks.len());
            let gate = ConcurrencyGate::new(cap);
            let shards = build_shards(&tasks, self.config.shard_size)?;

            lock_unpoisoned(&aggregator).start_iteration(iteration, tasks.len());
            lock_unpoisoned(&progress).update_iteration(iteration, iterations);
            self.emit_iteration_start(&run_id, iteration, shards.len());

            for shard in shards {
                let ctx = DispatchContext {
                    run_id: run_id.clone(),
                    iteration,
                    gate: Arc::clone(&gate),
                    handler: Arc::clone(&self.handler),
                    retry_strategy: self.retry_strategy.clone(),
                    task_timeout: self.config.task_timeout(),
                    cancel: self.cancel.clone(),
                    aggregator: Arc::clone(&aggregator),
                    progress: Arc::clone(&progress),
                    renderer: self.renderer.clone(),
                    opts: self.opts.clone(),
                };
                dispatch_shard(shard, ctx).await?;

                if self.cancel.is_cancelled() {
                    break;
                }
            }

            let cancelled = self.cancel.is_cancelled();
            let record = {
                let mut agg = lock_unpoisoned(&aggregator);
                agg.observe_peak(gate.peak());
                agg.finish_iteration(!cancelled)
            };
            self.emit_iteration_end(&run_id, &record);

            if cancelled {
                tracing::warn!(run_id = %run_id, iteration, "cancellation signal received, stopping run");
                status = RunStatus::Cancelled;
                break;
            }

            let failure_rate = record.failure_rate();
            if failure_rate > self.config.abort_failure_rate {
                tracing::warn!(
                    run_id = %run_id,
                    iteration,
                    failure_rate,
                    threshold = self.config.abort_failure_rate,
                    "iteration failure rate exceeded threshold, aborting run"
                );
                status = RunStatus::Aborted;
                break;
            }

            // Mid-run checkpoint; the terminal iteration is covered by the
            // final report persisted below.
            if iteration < iterations && iteration % self.config.checkpoint_interval == 0 {
                let snapshot = lock_unpoisoned(&aggregator).snapshot();
                self.persist_report(&snapshot);
                self.emit_checkpoint(&run_id, &snapshot);
            }
        }

        let report = lock_unpoisoned(&aggregator).finalize(status);
        self.persist_report(&report);

        lock_unpoisoned(&progress)
            .finish(status == RunStatus::Completed && report.tasks_failed == 0);
        self.emit_run_end(&run_id, &report);

        tracing::info!(
            run_id = %run_id,
            status = ?report.status,
            completed = report.tasks_completed,
            failed = report.tasks_failed,
            peak = report.peak_concurrency,
            "run finished"
        );

        Ok(report)
    }

    fn effective_cap(&self, queued_tasks: usize) -> usize {
        let base = self.config.max_concurrent;
        self.concurrency_strategy
            .as_ref()
            .map(|strategy| {
                let context = ConcurrencyContext {
                    queued_tasks,
                    base_concurrency: base,
                };
                strategy.calculate_concurrency(&context)
            })
            .unwrap_or(base)
            .max(1)
    }

    /// Best-effort persistence; the in-memory aggregate stays authoritative
    /// until a later write succeeds.
    fn persist_report(&self, report: &StatusReport) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.persist(report) {
            tracing::warn!(sink = sink.name(), error = %e, "failed to persist status report");
        }
    }

    fn emit_run_start(&self, run_id: &str, tasks_per_iteration: usize) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::RunStart {
                run_id: run_id.to_string(),
                iterations: self.config.iterations,
                tasks_per_iteration,
                max_concurrent: self.config.max_concurrent,
            });
        } else {
            output::emit_run_start(
                &self.opts,
                run_id,
                self.config.iterations,
                tasks_per_iteration,
                self.config.max_concurrent,
            );
        }
    }

    fn emit_iteration_start(&self, run_id: &str, iteration: u32, shards: usize) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::IterationStart {
                run_id: run_id.to_string(),
                iteration,
                shards,
            });
        } else {
            output::emit_iteration_start(&self.opts, run_id, iteration, shards);
        }
    }

    fn emit_iteration_end(&self, run_id: &str, record: &IterationRecord) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::IterationEnd {
                run_id: run_id.to_string(),
                record: record.clone(),
            });
        } else {
            output::emit_iteration_end(&self.opts, run_id, record);
        }
    }

    fn emit_checkpoint(&self, run_id: &str, report: &StatusReport) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::Checkpoint {
                run_id: run_id.to_string(),
                report: report.clone(),
            });
        } else {
            output::emit_checkpoint(&self.opts, run_id, report);
        }
    }

    fn emit_run_end(&self, run_id: &str, report: &StatusReport) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::RunEnd {
                run_id: run_id.to_string(),
                report: report.clone(),
            });
        } else {
            output::emit_run_end(&self.opts, run_id, report);
        }
    }
}

impl OrchestratorBuilder {
    pub fn new(config: OrchestratorConfig, handler: Arc<dyn TaskHandler>) -> Self {
        Self {
            config,
            handler,
            retry_strategy: None,
            concurrency_strategy: None,
            renderer: None,
            sink: None,
            opts: OutputOpts::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn retry_strategy(mut self, strategy: Arc<dyn RetryStrategyPlugin>) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    pub fn concurrency_strategy(mut self, strategy: Arc<dyn ConcurrencyStrategyPlugin>) -> Self {
        self.concurrency_strategy = Some(strategy);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn report_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn output_opts(mut self, opts: OutputOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            config: self.config,
            handler: self.handler,
            retry_strategy: self.retry_strategy,
            concurrency_strategy: self.concurrency_strategy,
            renderer: self.renderer,
            sink: self.sink,
            opts: self.opts,
            cancel: self.cancel,
        }
    }
}
