//! Fan-out helpers over collections of workers.
//!
//! Thin wrappers around the per-worker lifecycle operations; none of them
//! add semantics beyond iterating. Hook failures in batch operations are
//! logged, not propagated, so one misbehaving worker cannot abort the
//! sweep over the rest.

use futures::future::join_all;
use tracing::warn;

use crate::job::CyclicJob;
use crate::worker::CyclicWorker;

/// Starts every worker without waiting for any of them.
pub async fn start_all<J: CyclicJob>(workers: &[CyclicWorker<J>]) {
    for worker in workers {
        worker.start(false).await;
    }
}

/// Starts every worker, then waits until every loop has terminated.
///
/// Loops normally never terminate on their own, so this returns only once
/// every worker has been stopped from elsewhere.
pub async fn start_and_join_all<J: CyclicJob>(workers: &[CyclicWorker<J>]) {
    join_all(workers.iter().map(|worker| worker.start(true))).await;
}

/// Signals every worker to stop without waiting for the loops to unwind.
pub async fn stop_all<J: CyclicJob>(workers: &[CyclicWorker<J>]) {
    for worker in workers {
        if let Err(e) = worker.stop(false).await {
            warn!(error = %e, "worker skipped in batch stop");
        }
    }
}

/// Stops every worker concurrently and waits until all have fully unwound.
pub async fn stop_and_join_all<J: CyclicJob>(workers: &[CyclicWorker<J>]) {
    join_all(workers.iter().map(|worker| async move {
        if let Err(e) = worker.stop(true).await {
            warn!(error = %e, "worker skipped in batch stop");
        }
    }))
    .await;
}

/// Resets every worker; each stop/reset/start sequence runs detached.
pub async fn reset_all<J: CyclicJob>(workers: &[CyclicWorker<J>]) {
    for worker in workers {
        // Non-blocking reset never reports hook errors; they are logged
        // by the detached sequence.
        let _ = worker.reset(false).await;
    }
}

/// Resets every worker concurrently, waiting until each stop/reset/start
/// sequence has completed.
pub async fn reset_and_join_all<J: CyclicJob>(workers: &[CyclicWorker<J>]) {
    join_all(workers.iter().map(|worker| async move {
        if let Err(e) = worker.reset(true).await {
            warn!(error = %e, "worker skipped in batch reset");
        }
    }))
    .await;
}

/// Restarts every worker; each stop/start sequence runs detached.
pub async fn restart_all<J: CyclicJob>(workers: &[CyclicWorker<J>]) {
    for worker in workers {
        let _ = worker.restart(false).await;
    }
}

/// Restarts every worker concurrently, waiting until each stop/start
/// sequence has completed.
pub async fn restart_and_join_all<J: CyclicJob>(workers: &[CyclicWorker<J>]) {
    join_all(workers.iter().map(|worker| async move {
        if let Err(e) = worker.restart(true).await {
            warn!(error = %e, "worker skipped in batch restart");
        }
    }))
    .await;
}
