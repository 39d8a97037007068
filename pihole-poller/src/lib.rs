//! Pi-hole Poller - Refresh scheduler and HTTP stats client

pub mod client;
pub mod logging;
pub mod scheduler;

pub use client::{fetch_cycle, FetchError, FetchOutcome, HttpStatsClient, StatsClient};
pub use scheduler::{RefreshScheduler, RefreshTiming, SchedulerState};
