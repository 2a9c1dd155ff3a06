//! Maintenance scheduling tests.
//!
//! Verifies that:
//! 1. an explicit trigger causes exactly one pass at the next evaluation
//! 2. the trigger latch clears after the attempt, success or failure
//! 3. disabled maintenance never runs during cycling, only on shutdown
//! 4. time-based maintenance follows the configured cadence
//! 5. a pending trigger is honored by the final shutdown pass

use cycler::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Default)]
struct Counters {
    executions: AtomicU32,
    maintenances: AtomicU32,
    fail_maintenance: AtomicBool,
}

impl Counters {
    fn executions(&self) -> u32 {
        self.executions.load(Ordering::SeqCst)
    }

    fn maintenances(&self) -> u32 {
        self.maintenances.load(Ordering::SeqCst)
    }
}

struct MaintJob {
    counters: Arc<Counters>,
}

#[async_trait]
impl CyclicJob for MaintJob {
    async fn execute(&self) -> Result<(), BoxError> {
        self.counters.executions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn maintenance(&self) -> Result<(), BoxError> {
        self.counters.maintenances.fetch_add(1, Ordering::SeqCst);
        if self.counters.fail_maintenance.load(Ordering::SeqCst) {
            return Err("induced maintenance failure".into());
        }
        Ok(())
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn maint_worker(name: &str) -> (CyclicWorker<MaintJob>, Arc<Counters>) {
    init_logging();
    let counters = Arc::new(Counters::default());
    let job = MaintJob {
        counters: Arc::clone(&counters),
    };
    (CyclicWorker::new(job, name), counters)
}

#[tokio::test]
async fn trigger_causes_exactly_one_pass() {
    let (worker, counters) = maint_worker("trigger-once");
    worker.set_execution_interval(Duration::from_millis(10));

    worker.start(false).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(counters.maintenances(), 0, "no trigger, no maintenance");

    worker.trigger_maintenance();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counters.maintenances(), 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counters.maintenances(), 1, "the latch must clear after the pass");

    worker.stop(true).await.unwrap();
    assert_eq!(counters.maintenances(), 1, "no shutdown pass without the flag");
}

#[tokio::test]
async fn latch_clears_even_when_maintenance_fails() {
    let (worker, counters) = maint_worker("failing-maintenance");
    worker.set_execution_interval(Duration::from_millis(10));
    counters.fail_maintenance.store(true, Ordering::SeqCst);

    worker.start(false).await;
    worker.trigger_maintenance();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(counters.maintenances(), 1, "one attempt, despite the failure");
    assert!(worker.is_active(), "maintenance failure must never abort the loop");

    counters.fail_maintenance.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counters.maintenances(), 1, "a failed attempt still clears the latch");

    worker.stop(true).await.unwrap();
}

#[tokio::test]
async fn disabled_maintenance_runs_only_as_the_shutdown_pass() {
    let (worker, counters) = maint_worker("shutdown-only");
    let worker = worker
        .with_execution_interval(Duration::from_millis(10))
        .with_maintenance_on_stop(true);

    worker.start(false).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(counters.maintenances(), 0, "never during normal cycling");

    worker.stop(true).await.unwrap();
    assert_eq!(counters.maintenances(), 1, "exactly the final shutdown pass");
}

#[tokio::test]
async fn no_shutdown_pass_without_the_flag() {
    let (worker, counters) = maint_worker("no-shutdown-pass");
    worker.set_execution_interval(Duration::from_millis(10));

    worker.start(false).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    worker.stop(true).await.unwrap();

    assert_eq!(counters.maintenances(), 0);
}

#[tokio::test]
async fn pending_trigger_is_honored_by_the_shutdown_pass() {
    let (worker, counters) = maint_worker("trigger-at-shutdown");
    // Loop parks in the inter-execution delay; the trigger can only be
    // honored by the final shutdown pass.
    worker.set_execution_interval(Duration::from_secs(3600));

    worker.start(false).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    worker.trigger_maintenance();
    worker.stop(true).await.unwrap();

    assert_eq!(counters.maintenances(), 1);
}

#[tokio::test(start_paused = true)]
async fn time_based_cadence_matches_the_intervals() {
    let (worker, counters) = maint_worker("cadence");
    let worker = worker
        .with_execution_interval(Duration::from_millis(50))
        .with_maintenance_interval(Duration::from_millis(500))
        .with_time_based_maintenance(true);

    worker.start(false).await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    let executions = counters.executions();
    let maintenances = counters.maintenances();
    assert!(
        (38..=42).contains(&executions),
        "expected ~40 executions at 50ms cadence, got {executions}"
    );
    assert!(
        (3..=5).contains(&maintenances),
        "expected ~4 maintenances at 500ms cadence, got {maintenances}"
    );

    worker.stop(true).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn runtime_interval_change_takes_effect() {
    let (worker, counters) = maint_worker("interval-change");
    worker.set_execution_interval(Duration::from_millis(100));

    worker.start(false).await;
    tokio::time::sleep(Duration::from_millis(550)).await;
    let at_change = counters.executions();
    assert!((5..=7).contains(&at_change), "got {at_change}");

    worker.set_execution_interval(Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(500)).await;
    let after = counters.executions();
    assert!(
        after >= at_change + 35,
        "faster interval must speed up the cycle: {at_change} -> {after}"
    );

    worker.stop(true).await.unwrap();
}
