//! Cyclic worker lifecycle controller.
//!
//! Module organization following information hiding principles:
//! - `mod.rs`: lifecycle state machine and the public control surface
//! - `run_loop`: the execution & maintenance loop (hides cycle ordering)
//! - `maintenance`: the maintenance-due decision (hides the clock)

mod maintenance;
mod run_loop;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{Error, HookPhase, Result};
use crate::job::CyclicJob;

/// Observable lifecycle state of a worker.
///
/// Transitions: `Idle → Running → Stopping → Stopped → Running → …`.
/// A loop that terminates on its own (job failure with stop-on-error)
/// moves `Running → Stopped` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, never started.
    Idle,
    /// A loop instance is spawned and cycling.
    Running,
    /// Cancellation was delivered; the loop has not fully unwound yet.
    Stopping,
    /// The last loop instance completed its shutdown sequence.
    Stopped,
}

/// Snapshot of a worker's observable status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStatus {
    pub is_active: bool,
}

/// State shared between the controller handle and the running loop task.
///
/// Scalar configuration is atomic so the owning caller can mutate it
/// concurrently with the loop (benign races, no compound invariant).
/// Loop-private state (the maintenance clock) lives in the loop task, not
/// here.
pub(crate) struct Shared<J> {
    pub(crate) job: J,
    pub(crate) name: String,
    pub(crate) execution_interval_ms: AtomicU64,
    pub(crate) maintenance_interval_ms: AtomicU64,
    pub(crate) time_based_maintenance: AtomicBool,
    pub(crate) stop_on_error: AtomicBool,
    pub(crate) maintenance_on_stop: AtomicBool,
    /// Latched one-shot maintenance request. Cleared by the loop strictly
    /// after a maintenance attempt, success or failure.
    pub(crate) maintenance_forced: AtomicBool,
    pub(crate) state_tx: watch::Sender<WorkerState>,
    /// Cancellation token of the current loop instance. Exclusively
    /// replaced by the lifecycle controller, never by the loop body.
    current: Mutex<Option<CancellationToken>>,
}

/// A long-running cyclic background worker.
///
/// Wraps one background loop that repeatedly invokes
/// [`CyclicJob::execute`], interleaves a periodic maintenance routine, and
/// supports controlled lifecycle transitions (`start`, `stop`, `reset`,
/// `restart`, `join`), each with optional blocking semantics.
///
/// `CyclicWorker` is a cheap clone over shared state; clones control the
/// same underlying loop. At most one loop instance is active per worker at
/// any time: `start` on an active worker is a no-op, as is `stop` on an
/// inactive one.
///
/// # Example
///
/// ```no_run
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
///
/// #[tokio::main]
/// async fn main() -> Result<(), cycler::Error> {
///     let worker = CyclicWorker::new(Heartbeat { beats: AtomicU64::new(0) }, "heartbeat")
///         .with_execution_interval(Duration::from_millis(250));
///
///     worker.start(false).await;
///     tokio::time::sleep(Duration::from_secs(1)).await;
///     worker.stop(true).await?;
///     Ok(())
/// }
/// ```
pub struct CyclicWorker<J: CyclicJob> {
    shared: Arc<Shared<J>>,
}

impl<J: CyclicJob> Clone for CyclicWorker<J> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<J: CyclicJob> std::fmt::Debug for CyclicWorker<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CyclicWorker")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<J: CyclicJob> CyclicWorker<J> {
    /// Creates a worker for the given job.
    ///
    /// Defaults: 1s between executions, 60s between maintenance passes,
    /// time-based maintenance disabled, errors swallowed, no shutdown
    /// maintenance pass.
    pub fn new(job: J, name: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(WorkerState::Idle);
        Self {
            shared: Arc::new(Shared {
                job,
                name: name.into(),
                execution_interval_ms: AtomicU64::new(1_000),
                maintenance_interval_ms: AtomicU64::new(60_000),
                time_based_maintenance: AtomicBool::new(false),
                stop_on_error: AtomicBool::new(false),
                maintenance_on_stop: AtomicBool::new(false),
                maintenance_forced: AtomicBool::new(false),
                state_tx,
                current: Mutex::new(None),
            }),
        }
    }

    /// Sets the minimum delay between successive job executions.
    ///
    /// Default is 1 second. Also settable at runtime via
    /// [`set_execution_interval`](Self::set_execution_interval).
    pub fn with_execution_interval(self, interval: Duration) -> Self {
        self.set_execution_interval(interval);
        self
    }

    /// Sets the minimum elapsed time between maintenance passes.
    ///
    /// Default is 60 seconds. Only relevant with
    /// [`with_time_based_maintenance`](Self::with_time_based_maintenance).
    pub fn with_maintenance_interval(self, interval: Duration) -> Self {
        self.set_maintenance_interval(interval);
        self
    }

    /// Enables time-based maintenance triggering.
    ///
    /// When disabled (the default), maintenance runs only via
    /// [`trigger_maintenance`](Self::trigger_maintenance) or as the final
    /// shutdown pass.
    pub fn with_time_based_maintenance(self, enabled: bool) -> Self {
        self.shared
            .time_based_maintenance
            .store(enabled, Ordering::SeqCst);
        self
    }

    /// Makes an unhandled job failure terminate the loop instead of being
    /// swallowed and retried next cycle.
    pub fn with_stop_on_error(self, enabled: bool) -> Self {
        self.shared.stop_on_error.store(enabled, Ordering::SeqCst);
        self
    }

    /// Forces one final maintenance pass during shutdown, before the
    /// post-stop hook.
    pub fn with_maintenance_on_stop(self, enabled: bool) -> Self {
        self.shared
            .maintenance_on_stop
            .store(enabled, Ordering::SeqCst);
        self
    }

    /// Updates the delay between executions. Takes effect at the next
    /// inter-execution wait.
    pub fn set_execution_interval(&self, interval: Duration) {
        self.shared
            .execution_interval_ms
            .store(interval.as_millis() as u64, Ordering::SeqCst);
    }

    /// Current delay between executions.
    pub fn execution_interval(&self) -> Duration {
        Duration::from_millis(self.shared.execution_interval_ms.load(Ordering::SeqCst))
    }

    /// Updates the minimum elapsed time between maintenance passes. Takes
    /// effect at the next maintenance evaluation.
    pub fn set_maintenance_interval(&self, interval: Duration) {
        self.shared
            .maintenance_interval_ms
            .store(interval.as_millis() as u64, Ordering::SeqCst);
    }

    /// Current minimum elapsed time between maintenance passes.
    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_millis(self.shared.maintenance_interval_ms.load(Ordering::SeqCst))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.shared.state_tx.borrow()
    }

    /// Whether a loop instance is currently scheduled or running.
    ///
    /// Safe to query from any caller. A worker in `Stopping` is still
    /// active: its loop has not fully unwound.
    pub fn is_active(&self) -> bool {
        matches!(self.state(), WorkerState::Running | WorkerState::Stopping)
    }

    /// Snapshot of the worker's observable status.
    pub fn status(&self) -> WorkerStatus {
        WorkerStatus {
            is_active: self.is_active(),
        }
    }

    /// Requests one maintenance pass at the next evaluation point inside
    /// the running loop, regardless of elapsed time.
    ///
    /// The request is latched: it survives until a maintenance attempt
    /// happens (including the final shutdown pass) and is cleared after
    /// that attempt, success or failure.
    pub fn trigger_maintenance(&self) {
        self.shared.maintenance_forced.store(true, Ordering::SeqCst);
        debug!(worker = %self.shared.name, "maintenance triggered");
    }

    /// Starts the worker. No-op if a loop instance is already active.
    ///
    /// Spawns the execution loop as a new task on the tokio runtime. The
    /// pre-start hook runs inside that task, exactly once, before the
    /// first job execution.
    ///
    /// With `wait`, suspends until the loop terminates, which it normally
    /// never does except via cancellation.
    pub async fn start(&self, wait: bool) {
        let token = {
            let mut current = self
                .shared
                .current
                .lock()
                .expect("worker token Mutex poisoned - unrecoverable state");
            if self.is_active() {
                debug!(worker = %self.shared.name, "start ignored: already active");
                return;
            }
            let token = CancellationToken::new();
            *current = Some(token.clone());
            self.shared.state_tx.send_replace(WorkerState::Running);
            token
        };

        info!(worker = %self.shared.name, "starting");
        tokio::spawn(run_loop::run(Arc::clone(&self.shared), token));

        if wait {
            self.join().await;
        }
    }

    /// Signals the worker to stop. No-op if not active.
    ///
    /// Invokes the pre-cancellation hook, then delivers the cancellation
    /// signal. Cancellation is cooperative: the loop observes it at the
    /// top of the cycle and during the inter-execution delay, never
    /// mid-job. The shutdown sequence (final maintenance pass, post-stop
    /// hook) always completes.
    ///
    /// With `wait`, suspends until the loop has fully unwound, post-stop
    /// hook included. A blocking call that arrives while another stop is
    /// in flight joins the loop; if that in-flight stop is aborted by its
    /// hook failing, the join keeps waiting until a later stop (or the
    /// loop ending on its own) brings the worker down.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hook`] if the pre-cancellation hook fails; the
    /// stop is aborted and the loop keeps running.
    pub async fn stop(&self, wait: bool) -> Result<()> {
        let token = {
            let current = self
                .shared
                .current
                .lock()
                .expect("worker token Mutex poisoned - unrecoverable state");
            match (self.state(), current.as_ref()) {
                (WorkerState::Running, Some(token)) => {
                    // Claim the stop before awaiting the hook so a
                    // concurrent stop is a no-op instead of a second
                    // cancellation.
                    self.shared.state_tx.send_replace(WorkerState::Stopping);
                    Some(token.clone())
                }
                _ => None,
            }
        };
        let Some(token) = token else {
            // Not running, or a stop is already in flight. Still honor
            // the blocking preference.
            if wait {
                self.join().await;
            }
            return Ok(());
        };

        if let Err(source) = self.shared.job.on_stop().await {
            self.shared.state_tx.send_if_modified(|state| {
                if *state == WorkerState::Stopping {
                    *state = WorkerState::Running;
                    true
                } else {
                    false
                }
            });
            return Err(Error::Hook {
                phase: HookPhase::Stop,
                source,
            });
        }

        info!(worker = %self.shared.name, "stopping");
        token.cancel();

        if wait {
            self.join().await;
        }
        Ok(())
    }

    /// Stops the worker, invokes the reset hook, then starts it again.
    ///
    /// The internal stop always waits for the loop to unwind, regardless
    /// of `wait`: a restart over a live loop would violate the
    /// one-loop-per-worker invariant. With `wait` false the whole
    /// stop/reset/start sequence runs on a detached task and hook errors
    /// are logged instead of returned. Overlapping `reset` calls are not
    /// serialized; avoid issuing them concurrently.
    ///
    /// # Errors
    ///
    /// With `wait`, returns [`Error::Hook`] if the pre-cancellation or
    /// reset hook fails; the remainder of the sequence is skipped.
    pub async fn reset(&self, wait: bool) -> Result<()> {
        if wait {
            return self.reset_sequence().await;
        }
        let worker = self.clone();
        tokio::spawn(async move {
            if let Err(e) = worker.reset_sequence().await {
                error!(worker = %worker.shared.name, error = %e, "reset aborted");
            }
        });
        Ok(())
    }

    /// Stops the worker and starts it again, without the reset hook.
    ///
    /// Same composition and blocking semantics as [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// With `wait`, returns [`Error::Hook`] if the pre-cancellation hook
    /// fails.
    pub async fn restart(&self, wait: bool) -> Result<()> {
        if wait {
            return self.restart_sequence().await;
        }
        let worker = self.clone();
        tokio::spawn(async move {
            if let Err(e) = worker.restart_sequence().await {
                error!(worker = %worker.shared.name, error = %e, "restart aborted");
            }
        });
        Ok(())
    }

    /// Waits until the current loop instance completes, naturally or via
    /// cancellation. Returns immediately if no loop is active (including
    /// when the worker was never started).
    pub async fn join(&self) {
        let mut rx = self.shared.state_tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx
            .wait_for(|state| !matches!(*state, WorkerState::Running | WorkerState::Stopping))
            .await;
    }

    async fn reset_sequence(&self) -> Result<()> {
        self.stop(true).await?;
        self.shared
            .job
            .on_reset()
            .await
            .map_err(|source| Error::Hook {
                phase: HookPhase::Reset,
                source,
            })?;
        info!(worker = %self.shared.name, "reset");
        self.start(false).await;
        Ok(())
    }

    async fn restart_sequence(&self) -> Result<()> {
        self.stop(true).await?;
        self.start(false).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CyclicJob for Noop {
        async fn execute(&self) -> std::result::Result<(), BoxError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn fresh_worker_is_idle() {
        let worker = CyclicWorker::new(Noop, "idle");
        assert_eq!(worker.state(), WorkerState::Idle);
        assert!(!worker.is_active());
        assert_eq!(worker.status(), WorkerStatus { is_active: false });
    }

    #[tokio::test]
    async fn interval_setters_round_trip() {
        let worker = CyclicWorker::new(Noop, "intervals")
            .with_execution_interval(Duration::from_millis(250))
            .with_maintenance_interval(Duration::from_secs(5));
        assert_eq!(worker.execution_interval(), Duration::from_millis(250));
        assert_eq!(worker.maintenance_interval(), Duration::from_secs(5));

        worker.set_execution_interval(Duration::from_millis(10));
        worker.set_maintenance_interval(Duration::from_millis(500));
        assert_eq!(worker.execution_interval(), Duration::from_millis(10));
        assert_eq!(worker.maintenance_interval(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn defaults_match_documentation() {
        let worker = CyclicWorker::new(Noop, "defaults");
        assert_eq!(worker.execution_interval(), Duration::from_secs(1));
        assert_eq!(worker.maintenance_interval(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn join_is_a_noop_when_never_started() {
        let worker = CyclicWorker::new(Noop, "never-started");
        tokio::time::timeout(Duration::from_secs(1), worker.join())
            .await
            .expect("join on an idle worker must return immediately");
    }

    #[tokio::test]
    async fn stop_before_start_is_a_noop() {
        let worker = CyclicWorker::new(Noop, "stop-first");
        worker.stop(true).await.unwrap();
        assert_eq!(worker.state(), WorkerState::Idle);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let worker = CyclicWorker::new(Noop, "clone");
        let other = worker.clone();
        worker.set_execution_interval(Duration::from_millis(123));
        assert_eq!(other.execution_interval(), Duration::from_millis(123));
    }
}
