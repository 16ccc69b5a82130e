use std::sync::Arc;

use fanout_core::orchestrator::traits::{
    ConcurrencyStrategyPlugin, OutputRendererPlugin, RetryStrategyPlugin,
};
use fanout_core::orchestrator::types::{ConcurrencyConfig, OutputOpts, RetryConfig};

use crate::orchestrator::{
    AdaptiveConcurrencyPlugin, ExponentialBackoffPlugin, FixedConcurrencyPlugin,
    JsonlRendererPlugin, LinearRetryPlugin, TextRendererPlugin,
};

pub fn build_retry_strategy(cfg: &RetryConfig) -> Option<Arc<dyn RetryStrategyPlugin>> {
    match cfg.strategy.as_str() {
        "none" => None,
        "linear" => Some(Arc::new(LinearRetryPlugin::new(cfg.clone()))),
        "exponential-backoff" => Some(Arc::new(ExponentialBackoffPlugin::new(cfg.clone()))),
        other => {
            tracing::warn!(strategy = other, "unknown retry strategy, using exponential-backoff");
            Some(Arc::new(ExponentialBackoffPlugin::new(cfg.clone())))
        }
    }
}

pub fn build_concurrency_strategy(
    cfg: &ConcurrencyConfig,
    max_concurrent: usize,
) -> Arc<dyn ConcurrencyStrategyPlugin> {
    match cfg.strategy.as_str() {
        "adaptive" => Arc::new(AdaptiveConcurrencyPlugin::new(cfg.clone())),
        // Anything other than adaptive behaves like a fixed cap.
        _ => Arc::new(FixedConcurrencyPlugin::new(max_concurrent)),
    }
}

pub fn build_renderer(opts: &OutputOpts) -> Arc<dyn OutputRendererPlugin> {
    match opts.stream_format.as_str() {
        "jsonl" => Arc::new(JsonlRendererPlugin::new(false)),
        // Preserve existing behavior: anything other than jsonl behaves like text.
        _ => Arc::new(TextRendererPlugin::new(opts.ascii)),
    }
}
