use std::sync::Mutex;
use std::time::{Duration, Instant};

use fanout_core::orchestrator::traits::{ConcurrencyContext, ConcurrencyStrategyPlugin};
use fanout_core::orchestrator::types::ConcurrencyConfig;

/// CPU sample cache, refreshed at most once per second
struct SystemInfoCache {
    sys: sysinfo::System,
    cpu_count: usize,
    last_refresh: Instant,
    cached_cpu_usage: f32,
}

impl SystemInfoCache {
    fn new() -> Self {
        let mut sys = sysinfo::System::new();
        sys.refresh_cpu();
        let cpu_count = if sys.cpus().is_empty() {
            num_cpus::get().max(1)
        } else {
            sys.cpus().len()
        };
        let cpu_usage = sys.cpus().iter().map(|c| c.cpu_usage()).sum::<f32>() / cpu_count as f32;

        Self {
            sys,
            cpu_count,
            last_refresh: Instant::now(),
            cached_cpu_usage: cpu_usage,
        }
    }

    fn cpu_usage(&mut self) -> f32 {
        if self.last_refresh.elapsed() > Duration::from_secs(1) {
            self.sys.refresh_cpu();
            self.cached_cpu_usage =
                self.sys.cpus().iter().map(|c| c.cpu_usage()).sum::<f32>() / self.cpu_count as f32;
            self.last_refresh = Instant::now();
        }
        self.cached_cpu_usage
    }
}

/// Adjusts the concurrency cap per pass based on host CPU pressure
pub struct AdaptiveConcurrencyPlugin {
    config: ConcurrencyConfig,
    sys_cache: Mutex<SystemInfoCache>,
}

pub struct FixedConcurrencyPlugin {
    fixed: usize,
}

impl AdaptiveConcurrencyPlugin {
    pub fn new(config: ConcurrencyConfig) -> Self {
        Self {
            config,
            sys_cache: Mutex::new(SystemInfoCache::new()),
        }
    }

    fn adjusted_cap(&self, base: usize, cpu_usage: f32) -> usize {
        let mut desired = base;

        if cpu_usage >= self.config.cpu_threshold_high {
            desired = desired.saturating_div(2).max(self.config.min_concurrency);
        } else if cpu_usage <= self.config.cpu_threshold_low {
            desired = desired.saturating_mul(2).min(self.config.max_concurrency);
        }

        desired.clamp(self.config.min_concurrency, self.config.max_concurrency)
    }
}

impl FixedConcurrencyPlugin {
    pub fn new(fixed: usize) -> Self {
        Self { fixed }
    }
}

impl ConcurrencyStrategyPlugin for AdaptiveConcurrencyPlugin {
    fn name(&self) -> &str {
        "adaptive"
    }

    fn calculate_concurrency(&self, context: &ConcurrencyContext) -> usize {
        let cpu_usage = {
            let mut cache = match self.sys_cache.lock() {
                Ok(cache) => cache,
                Err(poisoned) => poisoned.into_inner(),
            };
            cache.cpu_usage()
        };

        // More slots than queued tasks is wasted admission bookkeeping.
        self.adjusted_cap(context.base_concurrency, cpu_usage)
            .min(context.queued_tasks.max(1))
    }
}

impl ConcurrencyStrategyPlugin for FixedConcurrencyPlugin {
    fn name(&self) -> &str {
        "fixed"
    }

    fn calculate_concurrency(&self, _context: &ConcurrencyContext) -> usize {
        self.fixed.max(1)
    }
}
