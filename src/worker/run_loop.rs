//! The execution & maintenance loop.
//!
//! One instance of this task exists per started worker. Cycle order is
//! strict: cancellation check, job execution, maintenance evaluation,
//! cancellable delay. The shutdown sequence at the bottom runs outside the
//! cancellable region and always completes.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::job::CyclicJob;
use crate::worker::maintenance::MaintenanceClock;
use crate::worker::{Shared, WorkerState};

pub(crate) async fn run<J: CyclicJob>(shared: Arc<Shared<J>>, token: CancellationToken) {
    debug!(worker = %shared.name, "loop task spawned");

    let started = match shared.job.on_start().await {
        Ok(()) => true,
        Err(e) => {
            error!(worker = %shared.name, error = %e, "pre-start hook failed, skipping cycle");
            false
        }
    };

    // Initial maintenance baseline, recorded before the first execution.
    let mut clock = MaintenanceClock::start();

    if started {
        loop {
            if token.is_cancelled() {
                break;
            }

            match shared.job.execute().await {
                Ok(()) => {}
                Err(e) => {
                    if shared.stop_on_error.load(Ordering::SeqCst) {
                        error!(worker = %shared.name, error = %e, "job failed, stopping");
                        break;
                    }
                    warn!(worker = %shared.name, error = %e, "job failed, retrying next cycle");
                }
            }

            evaluate_maintenance(&shared, &mut clock).await;

            let delay = Duration::from_millis(shared.execution_interval_ms.load(Ordering::SeqCst));
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    shutdown(&shared, &mut clock).await;
}

/// Runs maintenance if it is due: a latched trigger request wins, otherwise
/// time-based triggering applies when enabled and the interval elapsed.
async fn evaluate_maintenance<J: CyclicJob>(shared: &Arc<Shared<J>>, clock: &mut MaintenanceClock) {
    let forced = shared.maintenance_forced.load(Ordering::SeqCst);
    let time_based = shared.time_based_maintenance.load(Ordering::SeqCst);
    let interval = Duration::from_millis(shared.maintenance_interval_ms.load(Ordering::SeqCst));

    if !clock.due(forced, time_based, interval) {
        return;
    }

    debug!(worker = %shared.name, forced, "running maintenance");
    maintenance_pass(shared, clock).await;
}

/// One maintenance attempt. Failures are non-fatal to the main cycle. The
/// timestamp advances and the trigger latch clears after the attempt,
/// success or failure.
async fn maintenance_pass<J: CyclicJob>(shared: &Arc<Shared<J>>, clock: &mut MaintenanceClock) {
    if let Err(e) = shared.job.maintenance().await {
        warn!(worker = %shared.name, error = %e, "maintenance failed");
    }
    clock.mark_ran();
    shared.maintenance_forced.store(false, Ordering::SeqCst);
}

/// Shutdown sequence, entered once on loop exit for any reason. Not
/// cancellable: the cancellation signal must not cancel the outgoing
/// commit work.
async fn shutdown<J: CyclicJob>(shared: &Arc<Shared<J>>, clock: &mut MaintenanceClock) {
    let final_pass = shared.maintenance_on_stop.load(Ordering::SeqCst)
        || shared.maintenance_forced.load(Ordering::SeqCst);
    if final_pass {
        debug!(worker = %shared.name, "running final maintenance pass");
        maintenance_pass(shared, clock).await;
    }

    if let Err(e) = shared.job.on_post_stop().await {
        warn!(worker = %shared.name, error = %e, "post-stop hook failed");
    }

    shared
        .current
        .lock()
        .expect("worker token Mutex poisoned - unrecoverable state")
        .take();
    shared.state_tx.send_replace(WorkerState::Stopped);
    info!(worker = %shared.name, "stopped");
}
