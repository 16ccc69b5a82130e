use fanout_core::orchestrator::traits::{OutputRendererPlugin, RenderEvent};
use fanout_core::orchestrator::types::TaskStatus;

pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn status_label(&self, status: TaskStatus) -> &'static str {
        match status {
            TaskStatus::Success => {
                if self.ascii_only {
                    "OK"
                } else {
                    "SUCCESS"
                }
            }
            TaskStatus::Failure => {
                if self.ascii_only {
                    "FAIL"
                } else {
                    "FAILED"
                }
            }
            TaskStatus::TimedOut => "TIMEOUT",
            TaskStatus::FailedFinal => {
                if self.ascii_only {
                    "FAIL-FINAL"
                } else {
                    "FAILED (retries exhausted)"
                }
            }
        }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::RunStart {
                run_id,
                iterations,
                tasks_per_iteration,
                max_concurrent,
            } => format!(
                "RUN START {} (tasks: {}, iterations: {}, cap: {})",
                run_id, tasks_per_iteration, iterations, max_concurrent
            ),
            RenderEvent::IterationStart {
                run_id,
                iteration,
                shards,
            } => format!(
                "ITERATION START {} (iteration {}, shards: {})",
                run_id, iteration, shards
            ),
            RenderEvent::TaskStart {
                run_id,
                task_id,
                iteration,
            } => format!(
                "TASK START {} (iteration {}, task {})",
                run_id, iteration, task_id
            ),
            RenderEvent::TaskComplete {
                run_id,
                task_id,
                outcome,
            } => format!(
                "TASK END {} (task {}, status {}, duration {}ms, attempts {})",
                run_id,
                task_id,
                self.status_label(outcome.status),
                outcome.duration_ms,
                outcome.attempts
            ),
            RenderEvent::IterationEnd { run_id, record } => format!(
                "ITERATION END {} (iteration {}, completed {}, failed {})",
                run_id, record.iteration, record.tasks_completed, record.tasks_failed
            ),
            RenderEvent::Checkpoint { run_id, report } => format!(
                "CHECKPOINT {} (after iteration {}, {:.1}% of planned work)",
                run_id, report.iterations_run, report.completion_percentage
            ),
            RenderEvent::RunEnd { run_id, report } => format!(
                "RUN END {} (status {:?}, completed {}, failed {}, peak {})",
                run_id,
                report.status,
                report.tasks_completed,
                report.tasks_failed,
                report.peak_concurrency
            ),
        }
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        println!("{}", self.format_event(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use fanout_core::orchestrator::types::TaskOutcome;

    #[test]
    fn test_text_renderer_task_complete() {
        let renderer = TextRendererPlugin::new(true);
        let event = RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            task_id: "task".to_string(),
            outcome: TaskOutcome {
                task_id: "task".to_string(),
                category: String::new(),
                status: TaskStatus::Failure,
                error: Some("oops".to_string()),
                duration_ms: 5,
                completed_at: Local::now().to_rfc3339(),
                attempts: 2,
            },
        };

        let line = renderer.format_event(&event);
        assert!(line.contains("TASK END"));
        assert!(line.contains("status FAIL"));
        assert!(line.contains("attempts 2"));
    }
}
