//! Tracing subscriber setup shared by the dashboard binaries

use anyhow::Result;
use pihole_common::LoggingConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where logs go when no log file is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    /// The terminal belongs to the UI
    Discard,
}

/// Install the global subscriber. `RUST_LOG` overrides `config.level`.
pub fn init(config: &LoggingConfig, fallback: LogSink) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match (&config.file, fallback) {
        (Some(path), _) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        (None, LogSink::Stderr) => builder.with_writer(std::io::stderr).init(),
        (None, LogSink::Discard) => builder.with_writer(std::io::sink).init(),
    }

    Ok(())
}
