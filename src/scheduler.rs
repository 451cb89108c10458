//! Fixed-interval probe loop
//!
//! The only long-lived background task in the process. Cycles run strictly
//! sequentially: no jitter, no catch-up for missed intervals, and an
//! overrunning cycle simply delays the next one. The cancellation token is
//! observed at every cycle boundary so shutdown lets an in-flight cycle
//! finish and the exported metrics stay consistent.

use crate::probe::ProbeCycle;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Drives [`ProbeCycle`] forever on a fixed interval.
pub struct Scheduler {
    cycle: ProbeCycle,
    interval: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(cycle: ProbeCycle, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            cycle,
            interval,
            cancel,
        }
    }

    /// Spawn the probe loop as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "starting probe loop");

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let results = self.cycle.run().await;
            let failed = results.iter().filter(|r| !r.succeeded).count();
            tracing::debug!(steps = results.len(), failed, "probe cycle complete");

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("probe loop stopped");
    }
}
