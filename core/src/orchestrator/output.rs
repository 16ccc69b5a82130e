use chrono::Local;
use serde::Serialize;

use super::types::{IterationRecord, OutputOpts, StatusReport};

/// One line of the JSONL event stream
#[derive(Debug, Clone, Serialize)]
pub struct JsonlEvent {
    pub v: i32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub ts: String,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl JsonlEvent {
    fn new(event_type: &str, run_id: &str) -> Self {
        Self {
            v: 1,
            event_type: event_type.to_string(),
            ts: Local::now().to_rfc3339(),
            run_id: run_id.to_string(),
            task_id: None,
            error: None,
            code: None,
            progress: None,
            metadata: None,
        }
    }
}

pub fn emit_json(event: &JsonlEvent) {
    if let Ok(line) = serde_json::to_string(event) {
        println!("{line}");
    }
}

/// Emit run start event
pub fn emit_run_start(
    opts: &OutputOpts,
    run_id: &str,
    iterations: u32,
    tasks_per_iteration: usize,
    max_concurrent: usize,
) {
    if opts.stream_format == "jsonl" {
        let mut event = JsonlEvent::new("run.start", run_id);
        event.metadata = Some(serde_json::json!({
            "iterations": iterations,
            "tasks_per_iteration": tasks_per_iteration,
            "max_concurrent": max_concurrent,
        }));
        emit_json(&event);
    } else if !opts.quiet {
        println!(
            "🚀 Starting run: {} tasks × {} iterations (cap {})",
            tasks_per_iteration, iterations, max_concurrent
        );
    }
}

/// Emit iteration start event
pub fn emit_iteration_start(opts: &OutputOpts, run_id: &str, iteration: u32, shards: usize) {
    if opts.stream_format == "jsonl" {
        let mut event = JsonlEvent::new("iteration.start", run_id);
        event.metadata = Some(serde_json::json!({
            "iteration": iteration,
            "shards": shards,
        }));
        emit_json(&event);
    } else if opts.verbose && !opts.quiet {
        println!("▶ Iteration {} ({} shards)", iteration, shards);
    }
}

/// Emit task start event
pub fn emit_task_start(opts: &OutputOpts, run_id: &str, task_id: &str, iteration: u32) {
    if opts.stream_format == "jsonl" {
        let mut event = JsonlEvent::new("task.start", run_id);
        event.task_id = Some(task_id.to_string());
        event.metadata = Some(serde_json::json!({
            "iteration": iteration,
        }));
        emit_json(&event);
    } else if opts.verbose && !opts.quiet {
        println!("  ⏳ Starting task: {}", task_id);
    }
}

/// Emit task end event
pub fn emit_task_end(
    opts: &OutputOpts,
    run_id: &str,
    task_id: &str,
    success: bool,
    duration_ms: u64,
    attempts: u32,
    error: Option<&str>,
) {
    if opts.stream_format == "jsonl" {
        let mut event = JsonlEvent::new("task.end", run_id);
        event.task_id = Some(task_id.to_string());
        event.code = Some(if success { 0 } else { 1 });
        event.error = error.map(|e| e.to_string());
        event.metadata = Some(serde_json::json!({
            "duration_ms": duration_ms,
            "attempts": attempts,
            "success": success,
        }));
        emit_json(&event);
    } else if opts.verbose && !opts.quiet {
        let icon = if success { "✅" } else { "❌" };
        let retry_info = if attempts > 1 {
            format!(" (attempts: {})", attempts)
        } else {
            String::new()
        };
        println!("  {} Task {}: {}ms{}", icon, task_id, duration_ms, retry_info);
    }
}

/// Emit iteration end event
pub fn emit_iteration_end(opts: &OutputOpts, run_id: &str, record: &IterationRecord) {
    if opts.stream_format == "jsonl" {
        let mut event = JsonlEvent::new("iteration.end", run_id);
        let processed = record.tasks_completed + record.tasks_failed;
        let percentage = if record.tasks_total > 0 {
            (processed as f64 / record.tasks_total as f64 * 100.0) as u8
        } else {
            0
        };
        event.progress = Some(percentage);
        event.metadata = Some(serde_json::json!({
            "iteration": record.iteration,
            "tasks_total": record.tasks_total,
            "tasks_completed": record.tasks_completed,
            "tasks_failed": record.tasks_failed,
            "throughput": record.throughput,
        }));
        emit_json(&event);
    } else if !opts.quiet {
        println!(
            "📊 Iteration {}: {}/{} completed, {} failed",
            record.iteration, record.tasks_completed, record.tasks_total, record.tasks_failed
        );
    }
}

/// Emit checkpoint event after a snapshot is persisted
pub fn emit_checkpoint(opts: &OutputOpts, run_id: &str, report: &StatusReport) {
    if opts.stream_format == "jsonl" {
        let mut event = JsonlEvent::new("checkpoint", run_id);
        event.progress = Some(report.completion_percentage.min(100.0) as u8);
        event.metadata = Some(serde_json::json!({
            "iterations_run": report.iterations_run,
            "tasks_total": report.tasks_total,
            "tasks_completed": report.tasks_completed,
            "tasks_failed": report.tasks_failed,
        }));
        emit_json(&event);
    } else if opts.verbose && !opts.quiet {
        println!(
            "💾 Checkpoint after iteration {} ({:.1}%)",
            report.iterations_run, report.completion_percentage
        );
    }
}

/// Emit run end event
pub fn emit_run_end(opts: &OutputOpts, run_id: &str, report: &StatusReport) {
    if opts.stream_format == "jsonl" {
        let mut event = JsonlEvent::new("run.end", run_id);
        event.code = Some(if report.tasks_failed == 0 { 0 } else { 1 });
        event.metadata = Some(serde_json::json!({
            "status": report.status,
            "iterations_run": report.iterations_run,
            "tasks_total": report.tasks_total,
            "tasks_completed": report.tasks_completed,
            "tasks_failed": report.tasks_failed,
            "peak_concurrency": report.peak_concurrency,
            "completion_percentage": report.completion_percentage,
        }));
        emit_json(&event);
    } else if !opts.quiet {
        let icon = if report.tasks_failed == 0 { "✅" } else { "❌" };
        println!(
            "\n{} Run finished: {}/{} tasks completed across {} iterations ({:.1}%)",
            icon,
            report.tasks_completed,
            report.tasks_total,
            report.iterations_run,
            report.completion_percentage
        );
    }
}
