use chrono::Local;
use fanout_core::orchestrator::traits::{OutputRendererPlugin, RenderEvent};
use serde_json::{json, Value};

pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                iterations,
                tasks_per_iteration,
                max_concurrent,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "iterations": iterations,
                    "tasks_per_iteration": tasks_per_iteration,
                    "max_concurrent": max_concurrent,
                }
            }),
            RenderEvent::IterationStart {
                run_id,
                iteration,
                shards,
            } => json!({
                "v": 1,
                "event_type": "iteration.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "iteration": iteration,
                    "shards": shards,
                }
            }),
            RenderEvent::TaskStart {
                run_id,
                task_id,
                iteration,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "iteration": iteration,
                }
            }),
            RenderEvent::TaskComplete {
                run_id,
                task_id,
                outcome,
            } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "code": if outcome.status.is_success() { 0 } else { 1 },
                "error": outcome.error,
                "metadata": {
                    "status": outcome.status,
                    "duration_ms": outcome.duration_ms,
                    "attempts": outcome.attempts,
                    "success": outcome.status.is_success(),
                }
            }),
            RenderEvent::IterationEnd { run_id, record } => json!({
                "v": 1,
                "event_type": "iteration.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "iteration": record.iteration,
                    "tasks_total": record.tasks_total,
                    "tasks_completed": record.tasks_completed,
                    "tasks_failed": record.tasks_failed,
                    "throughput": record.throughput,
                }
            }),
            RenderEvent::Checkpoint { run_id, report } => json!({
                "v": 1,
                "event_type": "checkpoint",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "iterations_run": report.iterations_run,
                    "tasks_total": report.tasks_total,
                    "tasks_completed": report.tasks_completed,
                    "tasks_failed": report.tasks_failed,
                    "completion_percentage": report.completion_percentage,
                }
            }),
            RenderEvent::RunEnd { run_id, report } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "status": report.status,
                    "iterations_run": report.iterations_run,
                    "tasks_total": report.tasks_total,
                    "tasks_completed": report.tasks_completed,
                    "tasks_failed": report.tasks_failed,
                    "peak_concurrency": report.peak_concurrency,
                    "completion_percentage": report.completion_percentage,
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        let line = if self.pretty_print {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        if let Ok(line) = line {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::orchestrator::types::{TaskOutcome, TaskStatus};

    #[test]
    fn test_jsonl_renderer_task_complete() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            task_id: "task".to_string(),
            outcome: TaskOutcome {
                task_id: "task".to_string(),
                category: "alpha".to_string(),
                status: TaskStatus::FailedFinal,
                error: Some("boom".to_string()),
                duration_ms: 5,
                completed_at: Local::now().to_rfc3339(),
                attempts: 3,
            },
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "task.end");
        assert_eq!(value["code"], 1);
        assert_eq!(value["metadata"]["attempts"], 3);
        assert_eq!(value["metadata"]["status"], "failed_final");
    }
}
