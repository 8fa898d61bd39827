//! Periodic driver for the check cycle.

use std::time::Duration;

use page_monitor::{ChangeMonitor, CheckOutcome, CredentialSource, MonitorState, PageFetcher};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Counters collected while the scheduler runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub changes: u64,
    pub failures: u64,
    pub state: MonitorState,
}

/// Runs the first check immediately, then one per interval.
pub struct Scheduler<C, F> {
    monitor: ChangeMonitor<C, F>,
    interval: Duration,
    max_cycles: Option<u64>,
}

impl<C, F> Scheduler<C, F>
where
    C: CredentialSource,
    F: PageFetcher,
{
    pub fn new(monitor: ChangeMonitor<C, F>, interval: Duration) -> Self {
        Self {
            monitor,
            interval,
            max_cycles: None,
        }
    }

    /// Stop after `max_cycles` completed cycles.
    pub fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = Some(max_cycles);
        self
    }

    /// Drive check cycles until cancelled or the cycle limit is reached.
    ///
    /// Cycles never overlap. A cycle that overruns the interval makes the
    /// missed ticks collapse into one instead of firing back to back.
    /// Cancellation during a cycle abandons it without touching the state.
    pub async fn run<R>(&self, cancel: CancellationToken, mut on_outcome: R) -> RunSummary
    where
        R: FnMut(&CheckOutcome),
    {
        info!(
            url = %self.monitor.target_url(),
            interval_secs = self.interval.as_secs(),
            "Scheduler started"
        );
        let mut summary = RunSummary::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let (state, outcome) = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Shutdown requested during check; abandoning it");
                    break;
                }
                result = self.monitor.run_check_cycle(summary.state) => result,
            };

            summary.state = state;
            summary.cycles += 1;
            if outcome.is_change() {
                summary.changes += 1;
            }
            if outcome.is_failure() {
                summary.failures += 1;
            }
            debug!(
                cycle = summary.cycles,
                outcome = outcome.event_name(),
                detail = %outcome.description(),
                "Check cycle finished"
            );
            on_outcome(&outcome);

            if self.max_cycles.is_some_and(|max| summary.cycles >= max) {
                debug!(cycles = summary.cycles, "Cycle limit reached");
                break;
            }
        }

        summary
    }
}
