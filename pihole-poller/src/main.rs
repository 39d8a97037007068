//! pihole-poll - Headless Pi-hole stats dashboard

use anyhow::Result;
use pihole_common::{DashboardView, PiholeConfig, StatsEvent, StatsUpdate, ViewOptions};
use pihole_poller::logging::{self, LogSink};
use pihole_poller::{HttpStatsClient, RefreshScheduler, RefreshTiming};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Determine config path
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("pihole-stats.toml"));

    let existing = config_path.exists();
    let config = if existing {
        PiholeConfig::load(&config_path)?
    } else {
        PiholeConfig::default()
    };

    logging::init(&config.logging, LogSink::Stderr)?;
    info!("Starting pihole-poll v{}", env!("CARGO_PKG_VERSION"));

    if existing {
        info!("Loaded configuration from {}", config_path.display());
    } else {
        info!("No configuration file found, using defaults");
        // Save default config for reference
        if let Err(e) = config.save(&config_path) {
            error!("Failed to save default config: {}", e);
        }
    }

    let client = HttpStatsClient::new(&config)?;
    let (tx, mut rx) = mpsc::channel::<StatsUpdate>(16);
    let scheduler = RefreshScheduler::new(client, RefreshTiming::from(&config.refresh), tx);
    let scheduler_handle = tokio::spawn(scheduler.run());

    info!("Polling {}", config.api.api_url);
    let options = ViewOptions::new(&config.sources, &config.display);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
            Some(update) = rx.recv() => {
                match &update.event {
                    StatsEvent::SummaryUpdated(summary) => {
                        info!("Summary updated: {} queries, {} blocked", summary.dns_queries_today, summary.ads_blocked_today);
                    }
                    StatsEvent::SourcesUpdated(sources) => {
                        info!("Top sources updated: {} clients", sources.len());
                    }
                    StatsEvent::FetchFailed(reason) => {
                        warn!("Showing last known values: {}", reason);
                    }
                }
                print!("{}", DashboardView::build(&update.snapshot, options));
            }
        }
    }

    scheduler_handle.abort();
    info!("pihole-poll shutdown complete");
    Ok(())
}
