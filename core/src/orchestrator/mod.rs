//! Bounded-concurrency iterative task orchestrator
//!
//! Fans a batch of independent tasks out to a limited pool of concurrent
//! workers, repeats the pass for a configured number of iterations,
//! checkpoints cumulative progress, and emits a completion report. It
//! supports:
//! - Bounded-size sharding of arbitrarily large batches
//! - FIFO gate admission with a hard concurrency cap
//! - Per-task timeouts and pluggable retry strategies
//! - Failure-rate early abort and external cancellation
//! - Atomic checkpoint persistence through pluggable report sinks
//!
//! # Architecture
//!
//! ```text
//! Vec<Task>
//!   ↓
//! build_shards() → Vec<Vec<Task>> (bounded-size shards)
//!   ↓
//! Orchestrator::run() → iteration loop
//!   ↓
//! dispatch_shard() → ConcurrencyGate + TaskHandler (per-task timeout/retry)
//!   ↓
//! RunAggregator → IterationRecord, checkpoint snapshots
//!   ↓
//! StatusReport → ReportSink (atomic persist)
//! ```

mod aggregate;
mod controller;
mod dispatcher;
mod gate;
mod output;
mod progress;
mod shard;
pub mod traits;
pub mod types;

pub use aggregate::RunAggregator;
pub use controller::{Orchestrator, OrchestratorBuilder};
pub use gate::{ConcurrencyGate, GatePermit};
pub use output::{
    emit_checkpoint, emit_iteration_end, emit_iteration_start, emit_json, emit_run_end,
    emit_run_start, emit_task_end, emit_task_start, JsonlEvent,
};
pub use progress::ProgressMonitor;
pub use shard::build_shards;
pub use types::{
    ConcurrencyConfig, IterationRecord, OrchestratorConfig, OutputOpts, RetryConfig, RunStatus,
    StatusReport, Task, TaskOutcome, TaskStatus,
};
