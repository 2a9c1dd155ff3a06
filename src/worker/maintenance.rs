//! Maintenance scheduling decision.
//!
//! The clock is loop-private: only the run-loop task reads or advances it,
//! so the elapsed-time check needs no synchronization. The one cross-task
//! input, the latched force flag, is read by the caller and passed in.

use std::time::Duration;

use tokio::time::Instant;

/// Tracks when maintenance last ran for one worker.
///
/// Uses `tokio::time::Instant` so paused-time tests can drive the cadence
/// deterministically.
#[derive(Debug)]
pub(crate) struct MaintenanceClock {
    last_run: Instant,
}

impl MaintenanceClock {
    /// Baseline the clock at the current time. Called once per loop
    /// instance, before the first job execution.
    pub(crate) fn start() -> Self {
        Self {
            last_run: Instant::now(),
        }
    }

    /// Whether a maintenance pass should run now.
    ///
    /// A latched force request wins regardless of elapsed time; otherwise
    /// maintenance is due when time-based triggering is enabled and at
    /// least `interval` passed since the last run.
    pub(crate) fn due(&self, forced: bool, time_based: bool, interval: Duration) -> bool {
        forced || (time_based && self.last_run.elapsed() >= interval)
    }

    /// Record that a maintenance pass was attempted, success or failure.
    pub(crate) fn mark_ran(&mut self) {
        self.last_run = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn not_due_before_interval() {
        let clock = MaintenanceClock::start();
        tokio::time::advance(Duration::from_millis(40)).await;
        assert!(!clock.due(false, true, Duration::from_millis(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn due_after_interval() {
        let clock = MaintenanceClock::start();
        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(clock.due(false, true, Duration::from_millis(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn forced_wins_regardless_of_elapsed_time() {
        let clock = MaintenanceClock::start();
        assert!(clock.due(true, false, Duration::from_secs(3600)));
        assert!(clock.due(true, true, Duration::from_secs(3600)));
    }

    #[tokio::test(start_paused = true)]
    async fn never_due_when_disabled_and_not_forced() {
        let clock = MaintenanceClock::start();
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(!clock.due(false, false, Duration::from_millis(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn mark_ran_resets_the_baseline() {
        let mut clock = MaintenanceClock::start();
        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(clock.due(false, true, Duration::from_millis(100)));

        clock.mark_ran();
        assert!(!clock.due(false, true, Duration::from_millis(100)));

        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(clock.due(false, true, Duration::from_millis(100)));
    }
}
