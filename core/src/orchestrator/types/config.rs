use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 300;
pub const MAX_TASK_TIMEOUT_SECS: u64 = 60 * 60;

/// Orchestrator run configuration.
///
/// The configuration surface is consumed here; loading it from disk or a
/// front end is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum number of concurrently in-flight tasks
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Maximum number of tasks per shard
    #[serde(default = "default_shard_size")]
    pub shard_size: usize,

    /// Number of full passes over the batch
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Persist a report snapshot every N iterations
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u32,

    /// Per-task timeout in seconds (clamped to 1..=3600, default 300)
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,

    /// Abort the run when an iteration's failure rate exceeds this
    /// (strictly greater; 1.0 disables early stop)
    #[serde(default = "default_abort_failure_rate")]
    pub abort_failure_rate: f64,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            shard_size: default_shard_size(),
            iterations: default_iterations(),
            checkpoint_interval: default_checkpoint_interval(),
            task_timeout_secs: None,
            abort_failure_rate: default_abort_failure_rate(),
            retry: RetryConfig::default(),
            concurrency: ConcurrencyConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.max_concurrent == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.shard_size == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "shard_size must be at least 1".to_string(),
            ));
        }
        if self.iterations == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.checkpoint_interval == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "checkpoint_interval must be at least 1".to_string(),
            ));
        }
        if !self.abort_failure_rate.is_finite() || self.abort_failure_rate < 0.0 {
            return Err(OrchestratorError::InvalidConfig(
                "abort_failure_rate must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective per-task timeout, clamped to 1..=MAX_TASK_TIMEOUT_SECS
    pub fn task_timeout(&self) -> Duration {
        let secs = self
            .task_timeout_secs
            .unwrap_or(DEFAULT_TASK_TIMEOUT_SECS)
            .clamp(1, MAX_TASK_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }
}

fn default_max_concurrent() -> usize {
    8
}

fn default_shard_size() -> usize {
    50
}

fn default_iterations() -> u32 {
    1
}

fn default_checkpoint_interval() -> u32 {
    1
}

fn default_abort_failure_rate() -> f64 {
    0.5
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub base_delay_ms: u64,
    #[serde(default)]
    pub max_delay_ms: u64,
    /// Total attempts per task (first try + retries)
    #[serde(default)]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: default_retry_strategy(),
            base_delay_ms: 100,
            max_delay_ms: 5000,
            max_attempts: 3,
        }
    }
}

fn default_retry_strategy() -> String {
    "exponential-backoff".to_string()
}

/// Concurrency strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    #[serde(default = "default_concurrency_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub min_concurrency: usize,
    #[serde(default)]
    pub max_concurrency: usize,
    #[serde(default)]
    pub base_concurrency: usize,
    #[serde(default)]
    pub cpu_threshold_low: f32,
    #[serde(default)]
    pub cpu_threshold_high: f32,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            strategy: default_concurrency_strategy(),
            min_concurrency: 2,
            max_concurrency: 32,
            base_concurrency: 8,
            cpu_threshold_low: 50.0,
            cpu_threshold_high: 80.0,
        }
    }
}

fn default_concurrency_strategy() -> String {
    "fixed".to_string()
}

/// Event output options for the current run
#[derive(Debug, Clone)]
pub struct OutputOpts {
    /// Output stream format: "text" or "jsonl"
    pub stream_format: String,

    /// Verbose output (per-task and per-iteration lines)
    pub verbose: bool,

    /// Quiet mode (suppress all console output)
    pub quiet: bool,

    /// ASCII-only markers (no Unicode)
    pub ascii: bool,

    /// Enable visual progress bar (disabled for jsonl output)
    pub progress_bar: bool,
}

impl Default for OutputOpts {
    fn default() -> Self {
        Self {
            stream_format: "text".to_string(),
            verbose: false,
            quiet: true,
            ascii: false,
            progress_bar: false,
        }
    }
}

impl OutputOpts {
    /// Console output with a progress bar, for interactive embedding
    pub fn text() -> Self {
        Self {
            quiet: false,
            progress_bar: true,
            ..Self::default()
        }
    }

    /// Machine-readable JSONL event stream on stdout
    pub fn jsonl() -> Self {
        Self {
            stream_format: "jsonl".to_string(),
            quiet: false,
            progress_bar: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_default_and_clamp() {
        let mut cfg = OrchestratorConfig::default();
        assert_eq!(
            cfg.task_timeout(),
            Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS)
        );

        cfg.task_timeout_secs = Some(0);
        assert_eq!(cfg.task_timeout(), Duration::from_secs(1));

        cfg.task_timeout_secs = Some(MAX_TASK_TIMEOUT_SECS + 10);
        assert_eq!(
            cfg.task_timeout(),
            Duration::from_secs(MAX_TASK_TIMEOUT_SECS)
        );
    }

    #[test]
    fn validate_rejects_zero_values() {
        let mut cfg = OrchestratorConfig {
            max_concurrent: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        cfg.max_concurrent = 1;
        cfg.iterations = 0;
        assert!(cfg.validate().is_err());

        cfg.iterations = 1;
        cfg.abort_failure_rate = f64::NAN;
        assert!(cfg.validate().is_err());

        cfg.abort_failure_rate = 0.5;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_deserializes_from_toml_with_defaults() {
        let cfg: OrchestratorConfig = toml::from_str(
            r#"
            max_concurrent = 5
            iterations = 10

            [retry]
            strategy = "linear"
            max_attempts = 2
            "#,
        )
        .unwrap();

        assert_eq!(cfg.max_concurrent, 5);
        assert_eq!(cfg.iterations, 10);
        assert_eq!(cfg.shard_size, 50);
        assert_eq!(cfg.retry.strategy, "linear");
        assert_eq!(cfg.retry.max_attempts, 2);
        assert_eq!(cfg.concurrency.strategy, "fixed");
    }
}
