//! Fixed-rate poll scheduler.
//!
//! Drives a single [`Job`] at a fixed interval on the current task. Ticks are
//! strictly sequential: the next tick is due one interval after the previous
//! tick started, and if a tick overruns, the next one fires as soon as it
//! returns (no overlap, no burst of catch-up ticks).
//!
//! Shutdown is a `tokio::sync::watch` flag observed only between ticks, so a
//! running tick always completes.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Work performed once per tick.
#[async_trait]
pub trait Job: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Run one pass.
    async fn run(&self) -> Result<(), Self::Error>;
}

/// Counters for a finished scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A tick failed while fail-fast was enabled.
    #[error("Job '{job}' failed on tick {tick}: {source}")]
    JobFailed {
        job: String,
        tick: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Poll interval must be greater than zero")]
    ZeroInterval,
}

/// Create a shutdown flag pair. Send `true` to stop the scheduler.
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

pub struct PollScheduler {
    interval: Duration,
    fail_fast: bool,
}

impl PollScheduler {
    /// Fails with [`SchedulerError::ZeroInterval`] for a zero `interval`.
    pub fn new(interval: Duration) -> Result<Self, SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        Ok(Self {
            interval,
            fail_fast: false,
        })
    }

    /// Return the first job error instead of logging it and carrying on.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Run `job` until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// The first tick fires one interval after this call.
    pub async fn run<J: Job>(
        &self,
        job: &J,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<SchedulerStats, SchedulerError> {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut stats = SchedulerStats::default();
        info!(
            job = job.name(),
            interval_ms = self.interval.as_millis() as u64,
            fail_fast = self.fail_fast,
            "Scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped, stopping scheduler");
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            stats.ticks += 1;
            let tick = stats.ticks;
            debug!(job = job.name(), tick, "Tick started");

            match job.run().await {
                Ok(()) => stats.succeeded += 1,
                Err(e) => {
                    stats.failed += 1;
                    error!(job = job.name(), tick, error = %e, "Tick failed");
                    if self.fail_fast {
                        return Err(SchedulerError::JobFailed {
                            job: job.name().to_string(),
                            tick,
                            source: Box::new(e),
                        });
                    }
                }
            }
        }

        info!(
            job = job.name(),
            ticks = stats.ticks,
            failed = stats.failed,
            "Scheduler stopped"
        );
        Ok(stats)
    }
}
