//! Cyclic background workers for tokio.
//!
//! `cycler` provides [`CyclicWorker`], a long-running background task that
//! repeatedly executes a user-defined job, opportunistically runs a
//! periodic maintenance routine between cycles, and supports controlled
//! lifecycle transitions with optional blocking semantics.
//!
//! # Features
//!
//! - **Lifecycle control**: `start`, `stop`, `reset`, `restart`, `join`,
//!   each idempotent where repetition would otherwise duplicate or
//!   double-cancel a loop
//! - **Opportunistic maintenance**: time-based cadence, explicit one-shot
//!   triggering, and an optional forced pass during shutdown
//! - **Cooperative cancellation**: the loop observes the stop signal at
//!   defined suspension points; the shutdown sequence always completes
//! - **Lifecycle hooks**: pre-start, pre-cancellation, reset, post-stop,
//!   all default no-ops
//! - **Contained failures**: job and maintenance errors are reported via
//!   `tracing` and never escape to the worker's caller
//!
//! # Quick Start
//!
//! ```no_run
//! use cycler::prelude::*;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct Heartbeat {
//!     beats: AtomicU64,
//! }
//!
//! #[async_trait]
//! impl CyclicJob for Heartbeat {
//!     async fn execute(&self) -> Result<(), BoxError> {
//!         self.beats.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }
//!
//!     async fn maintenance(&self) -> Result<(), BoxError> {
//!         // compact logs, refresh caches, flush buffers, ...
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cycler::Error> {
//!     let worker = CyclicWorker::new(Heartbeat { beats: AtomicU64::new(0) }, "heartbeat")
//!         .with_execution_interval(Duration::from_millis(500))
//!         .with_maintenance_interval(Duration::from_secs(30))
//!         .with_time_based_maintenance(true);
//!
//!     worker.start(false).await;
//!
//!     // ... application runs ...
//!
//!     worker.trigger_maintenance();
//!     worker.stop(true).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! Each module hides a design decision that is likely to change:
//!
//! - [`job`]: the capability set a worker drives (hides the hook surface)
//! - [`worker`]: lifecycle state machine and loop (hides the scheduling
//!   and cancellation strategy)
//! - [`batch`]: fan-out helpers over collections of workers
//! - [`error`]: the error taxonomy
//!
//! # Concurrency Model
//!
//! Each worker owns exactly one loop task; within it, job execution,
//! maintenance evaluation, and the inter-execution delay are strictly
//! sequential. Multiple workers run independently with no shared state.
//! Scalar configuration (intervals, flags) is atomic and may be changed
//! by the owning caller while the loop runs.

pub mod batch;
pub mod error;
pub mod job;
pub mod worker;

pub use error::{BoxError, Error, HookPhase, Result};
pub use job::CyclicJob;
pub use worker::{CyclicWorker, WorkerState, WorkerStatus};

// Re-export dependencies used in the public API so users don't hit
// version mismatches.
pub use async_trait;
pub use tokio;

/// Prelude module for convenient glob imports.
///
/// # Example
///
/// ```
/// use cycler::prelude::*;
/// ```
pub mod prelude {
    pub use crate::batch::{
        reset_all, reset_and_join_all, restart_all, restart_and_join_all, start_all,
        start_and_join_all, stop_all, stop_and_join_all,
    };
    pub use crate::error::{BoxError, Error, HookPhase};
    pub use crate::job::CyclicJob;
    pub use crate::worker::{CyclicWorker, WorkerState, WorkerStatus};

    // Commonly needed external types.
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
    pub use std::time::Duration;
}
