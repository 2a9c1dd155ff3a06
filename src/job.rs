//! The capability set a worker drives: job, maintenance, and lifecycle hooks.

use async_trait::async_trait;

use crate::error::BoxError;

/// The work a [`CyclicWorker`](crate::CyclicWorker) executes, plus its
/// periodic maintenance routine and lifecycle hooks.
///
/// Only [`execute`](CyclicJob::execute) is required. Maintenance and the
/// four hooks default to no-ops, so a minimal job is a single method:
///
/// ```
/// use cycler::prelude::*;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// struct Heartbeat {
///     beats: AtomicU64,
/// }
///
/// #[async_trait]
/// impl CyclicJob for Heartbeat {
///     async fn execute(&self) -> Result<(), BoxError> {
///         self.beats.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     }
/// }
/// ```
///
/// # Error handling
///
/// `execute` and `maintenance` report failure by returning `Err`. Neither
/// propagates to the worker's caller: a failed execution is logged and
/// retried next cycle (or terminates the loop when the worker was built
/// with `with_stop_on_error`), and a failed maintenance pass is always
/// non-fatal to the main cycle.
///
/// Hooks are different: a hook error aborts the lifecycle transition it
/// guards and, for the caller-side hooks (`on_stop`, `on_reset`), is
/// returned from the public operation as [`Error::Hook`](crate::Error).
///
/// # Concurrency
///
/// Within one worker, `execute`, `maintenance`, and every hook run on a
/// single logical task and never overlap. Implementations may suspend
/// freely; the worker waits for each call to complete before proceeding.
/// A job that never yields delays shutdown until it returns, since
/// cancellation is cooperative.
#[async_trait]
pub trait CyclicJob: Send + Sync + 'static {
    /// The cyclically invoked unit of work.
    async fn execute(&self) -> Result<(), BoxError>;

    /// Periodic maintenance routine, interleaved with the main cycle.
    ///
    /// Runs when maintenance was explicitly triggered, when time-based
    /// maintenance is enabled and the maintenance interval elapsed, or as
    /// the forced final pass during shutdown (see
    /// [`with_maintenance_on_stop`](crate::CyclicWorker::with_maintenance_on_stop)).
    async fn maintenance(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once inside the freshly spawned loop task, before the first
    /// job execution. Failure aborts the loop before any work runs; the
    /// shutdown sequence still executes.
    async fn on_start(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called by [`stop`](crate::CyclicWorker::stop) before the
    /// cancellation signal is delivered. Failure aborts the stop: the loop
    /// keeps running.
    async fn on_stop(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called by [`reset`](crate::CyclicWorker::reset) between the stop
    /// completing and the next start beginning. Not called by `restart`.
    async fn on_reset(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called at the end of the shutdown sequence, after the final
    /// maintenance pass. Failure is logged; shutdown completes regardless.
    async fn on_post_stop(&self) -> Result<(), BoxError> {
        Ok(())
    }
}
