//! Renderer-facing view model
//!
//! Pure functions from a snapshot plus display settings to what a dashboard
//! shows. Renderers draw a [`DashboardView`] and never look at raw payloads.

use crate::config::{DisplayConfig, SourcesConfig};
use crate::snapshot::StatsSnapshot;
use std::fmt;

pub const LOADING_TEXT: &str = "LOADING...";

/// Settings that only affect presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub show_sources: bool,
    pub hostname_only: bool,
    pub full_color: bool,
}

impl ViewOptions {
    pub fn new(sources: &SourcesConfig, display: &DisplayConfig) -> Self {
        Self {
            show_sources: sources.show_sources,
            hostname_only: sources.show_source_hostname_only,
            full_color: display.full_color,
        }
    }
}

/// The four dashboard tiles, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    TotalQueries,
    BlockedToday,
    PercentageToday,
    Blocklist,
}

impl TileKind {
    pub fn all() -> &'static [TileKind] {
        &[
            TileKind::TotalQueries,
            TileKind::BlockedToday,
            TileKind::PercentageToday,
            TileKind::Blocklist,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            TileKind::TotalQueries => "Total queries",
            TileKind::BlockedToday => "Queries blocked",
            TileKind::PercentageToday => "Percent blocked",
            TileKind::Blocklist => "Domains on blocklist",
        }
    }

    /// Accent colour as RGB
    pub fn accent(&self) -> (u8, u8, u8) {
        match self {
            TileKind::TotalQueries => (0x00, 0x5c, 0x32),
            TileKind::BlockedToday => (0x00, 0x79, 0x97),
            TileKind::PercentageToday => (0xb1, 0x72, 0x0c),
            TileKind::Blocklist => (0x91, 0x32, 0x25),
        }
    }
}

/// How a tile uses its accent colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFill {
    /// Accent fills the tile background
    Background,
    /// Accent colours only the label
    Label,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub kind: TileKind,
    pub value: String,
    pub fill: TileFill,
}

/// One row of the top clients table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub client: String,
    pub requests: u64,
}

/// Everything a renderer draws for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    Loading,
    Ready {
        tiles: Vec<Tile>,
        sources: Vec<SourceRow>,
        footer: String,
    },
}

impl DashboardView {
    pub fn build(snapshot: &StatsSnapshot, options: ViewOptions) -> Self {
        if !snapshot.loaded() {
            return DashboardView::Loading;
        }

        let summary = snapshot.summary();
        let fill = if options.full_color {
            TileFill::Background
        } else {
            TileFill::Label
        };

        let tiles = TileKind::all()
            .iter()
            .map(|&kind| {
                let value = match kind {
                    TileKind::TotalQueries => summary.dns_queries_today.clone(),
                    TileKind::BlockedToday => summary.ads_blocked_today.clone(),
                    TileKind::PercentageToday => format!("{}%", summary.ads_percentage_today),
                    TileKind::Blocklist => summary.domains_being_blocked.clone(),
                };
                Tile { kind, value, fill }
            })
            .collect();

        let sources = if options.show_sources {
            source_rows(snapshot, options.hostname_only)
        } else {
            Vec::new()
        };

        let footer = format!(
            "{} DNS queries, {} domains blacklisted.",
            summary.dns_queries_today, summary.domains_being_blocked
        );

        DashboardView::Ready {
            tiles,
            sources,
            footer,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, DashboardView::Loading)
    }
}

/// Table rows for the top sources, labels truncated when `hostname_only` is set
pub fn source_rows(snapshot: &StatsSnapshot, hostname_only: bool) -> Vec<SourceRow> {
    snapshot
        .top_sources
        .iter()
        .map(|source| SourceRow {
            client: if hostname_only {
                source.hostname().to_string()
            } else {
                source.client.clone()
            },
            requests: source.requests,
        })
        .collect()
}

/// Plain-text rendering
impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardView::Loading => writeln!(f, "{}", LOADING_TEXT),
            DashboardView::Ready {
                tiles,
                sources,
                footer,
            } => {
                for tile in tiles {
                    writeln!(f, "{:<22}{:>12}", tile.kind.label(), tile.value)?;
                }
                if !sources.is_empty() {
                    let width = sources
                        .iter()
                        .map(|row| row.client.len())
                        .max()
                        .unwrap_or(0)
                        .max("Client".len());
                    writeln!(f)?;
                    writeln!(f, "{:<width$}  {:>8}", "Client", "Requests", width = width)?;
                    for row in sources {
                        writeln!(f, "{:<width$}  {:>8}", row.client, row.requests, width = width)?;
                    }
                }
                writeln!(f)?;
                writeln!(f, "{}", footer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{RawSummary, SourceCount, TopSources};

    fn options() -> ViewOptions {
        ViewOptions {
            show_sources: true,
            hostname_only: true,
            full_color: true,
        }
    }

    fn loaded_snapshot() -> StatsSnapshot {
        let mut snapshot = StatsSnapshot::new();
        let raw: RawSummary = serde_json::from_str(
            r#"{"domains_being_blocked": "120000", "dns_queries_today": "35000",
                "ads_blocked_today": "4200", "ads_percentage_today": "12.0"}"#,
        )
        .unwrap();
        snapshot.merge_summary(&raw);
        snapshot.merge_sources(Some(TopSources(vec![
            SourceCount::new("router.local|192.168.1.1", 42),
            SourceCount::new("192.168.1.50", 7),
        ])));
        snapshot
    }

    #[test]
    fn test_unloaded_snapshot_renders_loading() {
        let mut snapshot = StatsSnapshot::new();
        snapshot.merge_sources(Some(TopSources(vec![SourceCount::new("stale|1.1.1.1", 1)])));

        let view = DashboardView::build(&snapshot, options());
        assert!(view.is_loading());
        assert_eq!(view.to_string(), "LOADING...\n");
    }

    #[test]
    fn test_tiles_in_order_with_percentage_suffix() {
        let view = DashboardView::build(&loaded_snapshot(), options());
        let DashboardView::Ready { tiles, footer, .. } = view else {
            panic!("expected a ready view");
        };

        let values: Vec<&str> = tiles.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["35000", "4200", "12.0%", "120000"]);
        assert!(tiles.iter().all(|t| t.fill == TileFill::Background));
        assert_eq!(footer, "35000 DNS queries, 120000 domains blacklisted.");
    }

    #[test]
    fn test_hostname_only_truncates_label() {
        let rows = source_rows(&loaded_snapshot(), true);
        assert_eq!(
            rows[0],
            SourceRow {
                client: "router.local".to_string(),
                requests: 42
            }
        );
        assert_eq!(rows[1].client, "192.168.1.50");

        let rows = source_rows(&loaded_snapshot(), false);
        assert_eq!(rows[0].client, "router.local|192.168.1.1");
    }

    #[test]
    fn test_sources_hidden_when_disabled() {
        let mut opts = options();
        opts.show_sources = false;
        opts.full_color = false;

        let DashboardView::Ready { tiles, sources, .. } =
            DashboardView::build(&loaded_snapshot(), opts)
        else {
            panic!("expected a ready view");
        };
        assert!(sources.is_empty());
        assert!(tiles.iter().all(|t| t.fill == TileFill::Label));
    }

    #[test]
    fn test_build_is_idempotent() {
        let snapshot = loaded_snapshot();
        assert_eq!(
            DashboardView::build(&snapshot, options()),
            DashboardView::build(&snapshot, options())
        );
    }

    #[test]
    fn test_plain_text_rendering() {
        let text = DashboardView::build(&loaded_snapshot(), options()).to_string();
        assert!(text.contains("Total queries"));
        assert!(text.contains("12.0%"));
        assert!(text.contains("router.local"));
        assert!(!text.contains("192.168.1.1 "));
        assert!(text.ends_with("35000 DNS queries, 120000 domains blacklisted.\n"));
    }
}
