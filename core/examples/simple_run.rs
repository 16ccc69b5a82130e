//! Minimal orchestrator run over a simulated workload.
//!
//! Fans 20 tasks out to 5 concurrent workers, twice, with a handler that
//! sleeps briefly and rejects a few tasks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use fanout_core::orchestrator::traits::HandlerFn;
use fanout_core::orchestrator::types::{OrchestratorConfig, OutputOpts, Task};
use fanout_core::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let tasks: Vec<Task> = (0..20)
        .map(|i| {
            Task::new(format!("doc-{i}"), serde_json::json!({ "index": i }))
                .with_category(if i % 2 == 0 { "filings" } else { "letters" })
        })
        .collect();

    let handler = Arc::new(HandlerFn::new(|task: Task| async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        let index = task.payload["index"].as_u64().unwrap_or(0);
        if index % 7 == 3 {
            anyhow::bail!("upstream rejected {}", task.id);
        }
        Ok(serde_json::json!({ "processed": task.id }))
    }));

    let config = OrchestratorConfig {
        max_concurrent: 5,
        iterations: 2,
        ..Default::default()
    };

    let orchestrator = Orchestrator::builder(config, handler)
        .output_opts(OutputOpts::text())
        .build();

    let report = orchestrator.run(tasks).await?;

    println!(
        "\n{} completed, {} failed ({:.1}% of planned work, peak concurrency {})",
        report.tasks_completed,
        report.tasks_failed,
        report.completion_percentage,
        report.peak_concurrency
    );
    for (category, totals) in &report.per_category {
        println!("  {category}: {} ok / {} failed", totals.completed, totals.failed);
    }

    Ok(())
}
