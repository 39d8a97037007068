//! Timer-driven fetch, merge and notify cycle
//!
//! The scheduler owns the only [`StatsSnapshot`]. Each tick runs one
//! [`fetch_cycle`], merges whatever succeeded, sends copies of the snapshot to
//! the renderer and picks the next delay. The timer is re-armed only after a
//! cycle has finished, so two cycles never overlap.

use crate::client::{fetch_cycle, FetchError, FetchOutcome, StatsClient};
use pihole_common::{RefreshConfig, StatsEvent, StatsSnapshot, StatsUpdate};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Scheduler lifecycle; there is no terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, no timer armed yet
    Idle,
    /// Timer armed, waiting to fire
    Pending,
    /// A fetch cycle is in flight
    Fetching,
}

/// Delays used by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTiming {
    /// Delay after a fully successful cycle
    pub update_interval: Duration,
    /// Delay after a cycle with any failure
    pub retry_delay: Duration,
    /// Delay before the first cycle
    pub initial_load_delay: Duration,
}

impl From<&RefreshConfig> for RefreshTiming {
    fn from(config: &RefreshConfig) -> Self {
        Self {
            update_interval: config.update_interval(),
            retry_delay: config.retry_delay(),
            initial_load_delay: config.initial_load_delay(),
        }
    }
}

impl Default for RefreshTiming {
    fn default() -> Self {
        Self::from(&RefreshConfig::default())
    }
}

pub struct RefreshScheduler<C> {
    client: C,
    timing: RefreshTiming,
    snapshot: StatsSnapshot,
    state: SchedulerState,
    updates: mpsc::Sender<StatsUpdate>,
    consecutive_failures: u64,
}

impl<C: StatsClient> RefreshScheduler<C> {
    pub fn new(client: C, timing: RefreshTiming, updates: mpsc::Sender<StatsUpdate>) -> Self {
        Self {
            client,
            timing,
            snapshot: StatsSnapshot::new(),
            state: SchedulerState::Idle,
            updates,
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn snapshot(&self) -> &StatsSnapshot {
        &self.snapshot
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures
    }

    /// Drive the cycle forever. Stop it by aborting the task it runs in.
    pub async fn run(mut self) {
        let mut delay = self.timing.initial_load_delay;
        info!(
            "Refresh scheduler started, first fetch in {}ms",
            delay.as_millis()
        );

        loop {
            self.state = SchedulerState::Pending;
            debug!("Next refresh in {}ms", delay.as_millis());
            tokio::time::sleep(delay).await;
            delay = self.tick().await;
        }
    }

    /// Run exactly one fetch cycle and return the delay before the next one
    pub async fn tick(&mut self) -> Duration {
        self.state = SchedulerState::Fetching;
        info!("Getting data");

        let outcome = fetch_cycle(&self.client).await;
        let delay = self.apply(outcome).await;

        self.state = SchedulerState::Pending;
        delay
    }

    /// Merge the successful parts of a cycle and notify the renderer
    async fn apply(&mut self, outcome: FetchOutcome) -> Duration {
        let FetchOutcome { summary, sources } = outcome;
        let mut failures: Vec<FetchError> = Vec::new();

        match summary {
            Ok(raw) => {
                let first_load = !self.snapshot.loaded();
                let summary = self.snapshot.merge_summary(&raw);
                if first_load {
                    info!("First summary received, dashboard loaded");
                }
                self.notify(StatsEvent::SummaryUpdated(summary)).await;
            }
            Err(e) => {
                warn!("Summary fetch failed: {}", e);
                failures.push(e);
            }
        }

        match sources {
            Some(Ok(raw)) => {
                let sources = self.snapshot.merge_sources(raw.top_sources).clone();
                debug!("Merged {} top sources", sources.len());
                self.notify(StatsEvent::SourcesUpdated(sources)).await;
            }
            Some(Err(e)) => {
                warn!("Top sources fetch failed: {}", e);
                failures.push(e);
            }
            None => {}
        }

        if failures.is_empty() {
            self.consecutive_failures = 0;
            return self.timing.update_interval;
        }

        self.consecutive_failures += 1;
        warn!(
            consecutive_failures = self.consecutive_failures,
            "Refresh failed, retrying in {}ms",
            self.timing.retry_delay.as_millis()
        );

        // Before the first load the renderer keeps showing its loading state
        if self.snapshot.loaded() {
            let message = failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            self.notify(StatsEvent::FetchFailed(message)).await;
        }

        self.timing.retry_delay
    }

    async fn notify(&self, event: StatsEvent) {
        let update = StatsUpdate {
            event,
            snapshot: self.snapshot.clone(),
        };
        if self.updates.send(update).await.is_err() {
            debug!("No renderer listening for updates");
        }
    }
}
