//! Appliance wire payloads and the update events sent to renderers

use crate::snapshot::{StatsSnapshot, Summary};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary object returned by `api.php?summaryRaw`
///
/// Every key is optional; absent and `null` both deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSummary {
    #[serde(default)]
    pub domains_being_blocked: Option<RawStat>,

    #[serde(default)]
    pub dns_queries_today: Option<RawStat>,

    #[serde(default)]
    pub ads_blocked_today: Option<RawStat>,

    #[serde(default)]
    pub ads_percentage_today: Option<RawStat>,
}

/// A single statistic as the appliance sends it: either pre-formatted text or a JSON number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawStat {
    Text(String),
    Number(serde_json::Number),
}

impl RawStat {
    /// Display text, or `None` when the value carries nothing to show
    pub fn to_text(&self) -> Option<String> {
        match self {
            RawStat::Text(text) if text.trim().is_empty() => None,
            RawStat::Text(text) => Some(text.clone()),
            RawStat::Number(number) => Some(number.to_string()),
        }
    }
}

/// Sources object returned by `api.php?getQuerySources=N`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSources {
    #[serde(default)]
    pub top_sources: Option<TopSources>,
}

/// One row of the top clients table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    /// `"<host-or-ip>|<optional-extra>"`
    pub client: String,
    pub requests: u64,
}

impl SourceCount {
    pub fn new(client: impl Into<String>, requests: u64) -> Self {
        Self {
            client: client.into(),
            requests,
        }
    }

    /// Portion of the identifier before the first `|`
    pub fn hostname(&self) -> &str {
        self.client.split('|').next().unwrap_or(&self.client)
    }
}

/// Client identifier to request count, in the order the appliance sent them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopSources(pub Vec<SourceCount>);

impl TopSources {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceCount> {
        self.0.iter()
    }

    pub fn get(&self, client: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|source| source.client == client)
            .map(|source| source.requests)
    }
}

impl FromIterator<SourceCount> for TopSources {
    fn from_iter<I: IntoIterator<Item = SourceCount>>(iter: I) -> Self {
        TopSources(iter.into_iter().collect())
    }
}

impl Serialize for TopSources {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|s| (&s.client, s.requests)))
    }
}

impl<'de> Deserialize<'de> for TopSources {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TopSourcesVisitor)
    }
}

struct TopSourcesVisitor;

impl<'de> Visitor<'de> for TopSourcesVisitor {
    type Value = TopSources;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of client identifiers to request counts")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TopSources, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((client, requests)) = map.next_entry::<String, u64>()? {
            entries.push(SourceCount { client, requests });
        }
        Ok(TopSources(entries))
    }

    // PHP encodes an empty associative array as `[]`
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<TopSources, A::Error> {
        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_type(de::Unexpected::Seq, &self));
        }
        Ok(TopSources::default())
    }
}

/// What changed in an update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StatsEvent {
    /// The four summary fields were refreshed
    SummaryUpdated(Summary),

    /// The top sources mapping was refreshed
    SourcesUpdated(TopSources),

    /// A cycle failed while the dashboard was already loaded
    FetchFailed(String),
}

/// Notification from the scheduler to a renderer
///
/// The snapshot is a copy taken right after the merge; renderers never see
/// the scheduler's own instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsUpdate {
    pub event: StatsEvent,
    pub snapshot: StatsSnapshot,
}
