use async_trait::async_trait;

use crate::orchestrator::types::Task;

/// Task execution callback: the sole interface to external business logic.
///
/// Implementations must be safe to invoke concurrently from multiple
/// dispatch sites. A normal return is recorded as Success; an error return
/// is recorded as Failure and may be retried per the retry strategy.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn execute(&self, task: &Task) -> anyhow::Result<serde_json::Value>;
}

/// Adapter turning an async closure into a [`TaskHandler`]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> TaskHandler for HandlerFn<F>
where
    F: Fn(Task) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = anyhow::Result<serde_json::Value>> + Send,
{
    async fn execute(&self, task: &Task) -> anyhow::Result<serde_json::Value> {
        (self.f)(task.clone()).await
    }
}
