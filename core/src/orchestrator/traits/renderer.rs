use crate::orchestrator::types::{IterationRecord, StatusReport, TaskOutcome};

/// Output renderer plugin (controls event presentation)
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn supports_streaming(&self) -> bool {
        false
    }
    fn render(&self, event: &RenderEvent);
}

/// Run lifecycle events handed to renderers
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        iterations: u32,
        tasks_per_iteration: usize,
        max_concurrent: usize,
    },
    IterationStart {
        run_id: String,
        iteration: u32,
        shards: usize,
    },
    TaskStart {
        run_id: String,
        task_id: String,
        iteration: u32,
    },
    TaskComplete {
        run_id: String,
        task_id: String,
        outcome: TaskOutcome,
    },
    IterationEnd {
        run_id: String,
        record: IterationRecord,
    },
    Checkpoint {
        run_id: String,
        report: StatusReport,
    },
    RunEnd {
        run_id: String,
        report: StatusReport,
    },
}
