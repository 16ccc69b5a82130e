use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::Local;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::error::OrchestratorError;

use super::aggregate::RunAggregator;
use super::gate::ConcurrencyGate;
use super::output;
use super::progress::ProgressMonitor;
use super::traits::{OutputRendererPlugin, RenderEvent, RetryStrategyPlugin, TaskHandler};
use super::types::{OutputOpts, Task, TaskOutcome, TaskStatus};

/// Shared context for dispatching one pass
#[derive(Clone)]
pub(crate) struct DispatchContext {
    pub run_id: String,
    pub iteration: u32,
    pub gate: Arc<ConcurrencyGate>,
    pub handler: Arc<dyn TaskHandler>,
    pub retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
    pub task_timeout: Duration,
    pub cancel: CancellationToken,
    pub aggregator: Arc<Mutex<RunAggregator>>,
    pub progress: Arc<Mutex<ProgressMonitor>>,
    pub renderer: Option<Arc<dyn OutputRendererPlugin>>,
    pub opts: OutputOpts,
}

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Execute one shard: all tasks concurrently, bounded by the shared gate.
///
/// Tasks admitted after the cancellation signal are skipped without an
/// outcome; tasks already in flight finish or time out normally.
pub(crate) async fn dispatch_shard(
    shard: Vec<Task>,
    ctx: DispatchContext,
) -> Result<(), OrchestratorError> {
    {
        let mut monitor = lock_unpoisoned(&ctx.progress);
        for task in &shard {
            monitor.add_task(&task.id);
        }
    }

    let mut futs: FuturesUnordered<_> = FuturesUnordered::new();
    for task in shard {
        futs.push(run_task(task, ctx.clone()));
    }

    while let Some(res) = futs.next().await {
        res?;
    }

    Ok(())
}

/// Run a single task to its final outcome and record it exactly once.
///
/// The gate slot is held across retry attempts and released as soon as the
/// outcome is determined, before the outcome is recorded.
async fn run_task(task: Task, ctx: DispatchContext) -> Result<(), OrchestratorError> {
    if ctx.cancel.is_cancelled() {
        return Ok(());
    }

    let permit = tokio::select! {
        _ = ctx.cancel.cancelled() => return Ok(()),
        permit = ctx.gate.acquire() => permit?,
    };

    emit_task_start(&ctx, &task.id);

    let started = Instant::now();
    let max_attempts = ctx
        .retry_strategy
        .as_ref()
        .map(|strategy| strategy.max_attempts().max(1))
        .unwrap_or(1);

    let mut attempt: u32 = 0;
    let mut last_error: Option<String> = None;
    let final_status;

    loop {
        attempt += 1;
        let attempt_result =
            tokio::time::timeout(ctx.task_timeout, ctx.handler.execute(&task)).await;

        let (status, error) = match attempt_result {
            Ok(Ok(_output)) => (TaskStatus::Success, None),
            Ok(Err(e)) => (TaskStatus::Failure, Some(e.to_string())),
            // The in-flight invocation is dropped here, cancelling it.
            Err(_) => (
                TaskStatus::TimedOut,
                Some(format!(
                    "timed out after {}s",
                    ctx.task_timeout.as_secs()
                )),
            ),
        };

        if status.is_success() {
            last_error = None;
            final_status = TaskStatus::Success;
            break;
        }

        last_error = error;
        let err_text = last_error.clone().unwrap_or_default();

        if let Some(strategy) = &ctx.retry_strategy {
            if attempt < max_attempts && strategy.should_retry(attempt, &err_text) {
                if let Some(delay) = strategy.next_delay(attempt, &err_text) {
                    tracing::warn!(
                        task_id = %task.id,
                        attempt,
                        error = %err_text,
                        "task attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
            final_status = TaskStatus::FailedFinal;
        } else {
            final_status = status;
        }
        break;
    }

    // Slot freed before the outcome is recorded.
    drop(permit);

    let duration_ms = started.elapsed().as_millis() as u64;
    let outcome = TaskOutcome {
        task_id: task.id.clone(),
        category: task.category.clone(),
        status: final_status,
        error: last_error,
        duration_ms,
        completed_at: Local::now().to_rfc3339(),
        attempts: attempt,
    };

    emit_task_complete(&ctx, &outcome);

    {
        let mut agg = lock_unpoisoned(&ctx.aggregator);
        agg.record(&outcome);
    }
    {
        let mut monitor = lock_unpoisoned(&ctx.progress);
        monitor.complete_task(&task.id, outcome.status.is_success(), duration_ms);
    }

    Ok(())
}

fn emit_task_start(ctx: &DispatchContext, task_id: &str) {
    if let Some(renderer) = &ctx.renderer {
        renderer.render(&RenderEvent::TaskStart {
            run_id: ctx.run_id.clone(),
            task_id: task_id.to_string(),
            iteration: ctx.iteration,
        });
    } else {
        output::emit_task_start(&ctx.opts, &ctx.run_id, task_id, ctx.iteration);
    }
}

fn emit_task_complete(ctx: &DispatchContext, outcome: &TaskOutcome) {
    if let Some(renderer) = &ctx.renderer {
        renderer.render(&RenderEvent::TaskComplete {
            run_id: ctx.run_id.clone(),
            task_id: outcome.task_id.clone(),
            outcome: outcome.clone(),
        });
    } else {
        output::emit_task_end(
            &ctx.opts,
            &ctx.run_id,
            &outcome.task_id,
            outcome.status.is_success(),
            outcome.duration_ms,
            outcome.attempts,
            outcome.error.as_deref(),
        );
    }
}
