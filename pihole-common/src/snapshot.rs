//! The latest merged view of the appliance statistics

use crate::messages::{RawStat, RawSummary, TopSources};
use serde::{Deserialize, Serialize};

const DEFAULT_COUNT: &str = "0";
const DEFAULT_PERCENTAGE: &str = "0.0";

/// Summary fields after defaults have been applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub domains_being_blocked: String,
    pub dns_queries_today: String,
    pub ads_blocked_today: String,
    pub ads_percentage_today: String,
}

impl Summary {
    /// Apply per-field defaults to a raw payload.
    ///
    /// Only absent, `null` and blank values fall back; a real zero is kept.
    pub fn from_raw(raw: &RawSummary) -> Self {
        Self {
            domains_being_blocked: or_default(&raw.domains_being_blocked, DEFAULT_COUNT),
            dns_queries_today: or_default(&raw.dns_queries_today, DEFAULT_COUNT),
            ads_blocked_today: or_default(&raw.ads_blocked_today, DEFAULT_COUNT),
            ads_percentage_today: or_default(&raw.ads_percentage_today, DEFAULT_PERCENTAGE),
        }
    }
}

fn or_default(value: &Option<RawStat>, default: &str) -> String {
    value
        .as_ref()
        .and_then(RawStat::to_text)
        .unwrap_or_else(|| default.to_string())
}

/// Latest known statistics
///
/// Summary fields stay `None` until the first summary merge. Each category is
/// merged on its own, so a missing category never clears another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub domains_blocked: Option<String>,
    pub dns_queries_today: Option<String>,
    pub ads_blocked_today: Option<String>,
    pub ads_percentage_today: Option<String>,
    pub top_sources: TopSources,
    loaded: bool,
}

impl StatsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a summary has been merged
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// Merge a summary payload and mark the snapshot loaded
    pub fn merge_summary(&mut self, raw: &RawSummary) -> Summary {
        let summary = Summary::from_raw(raw);
        self.domains_blocked = Some(summary.domains_being_blocked.clone());
        self.dns_queries_today = Some(summary.dns_queries_today.clone());
        self.ads_blocked_today = Some(summary.ads_blocked_today.clone());
        self.ads_percentage_today = Some(summary.ads_percentage_today.clone());
        self.loaded = true;
        summary
    }

    /// Replace the top sources mapping; `None` merges as empty
    pub fn merge_sources(&mut self, sources: Option<TopSources>) -> &TopSources {
        self.top_sources = sources.unwrap_or_default();
        &self.top_sources
    }

    /// Summary fields as the renderer displays them
    pub fn summary(&self) -> Summary {
        Summary {
            domains_being_blocked: display(&self.domains_blocked, DEFAULT_COUNT),
            dns_queries_today: display(&self.dns_queries_today, DEFAULT_COUNT),
            ads_blocked_today: display(&self.ads_blocked_today, DEFAULT_COUNT),
            ads_percentage_today: display(&self.ads_percentage_today, DEFAULT_PERCENTAGE),
        }
    }
}

fn display(value: &Option<String>, default: &str) -> String {
    value.clone().unwrap_or_else(|| default.to_string())
}
