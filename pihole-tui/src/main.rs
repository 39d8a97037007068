//! Pi-hole TUI - Terminal dashboard for Pi-hole statistics

mod app;
mod ui;

use anyhow::Result;
use app::App;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use pihole_common::{PiholeConfig, StatsUpdate};
use pihole_poller::logging::{self, LogSink};
use pihole_poller::{HttpStatsClient, RefreshScheduler, RefreshTiming};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
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

    // Logs only go to a file; the terminal is ours
    logging::init(&config.logging, LogSink::Discard)?;
    info!("Starting pihole-tui v{}", env!("CARGO_PKG_VERSION"));
    if !existing {
        info!("No configuration file found, using defaults");
        if let Err(e) = config.save(&config_path) {
            error!("Failed to save default config: {}", e);
        }
    }

    // Start the refresh cycle
    let client = HttpStatsClient::new(&config)?;
    let (tx, updates) = mpsc::channel::<StatsUpdate>(16);
    let scheduler = RefreshScheduler::new(client, RefreshTiming::from(&config.refresh), tx);
    let scheduler_handle = tokio::spawn(scheduler.run());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and run
    let mut app = App::new(&config);
    let res = run_app(&mut terminal, &mut app, updates).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    scheduler_handle.abort();

    if let Err(e) = res {
        error!("Application error: {}", e);
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut updates: mpsc::Receiver<StatsUpdate>,
) -> Result<()> {
    let mut events = EventStream::new();
    // Keeps the "last update" age current between refreshes
    let mut redraw = tokio::time::interval(Duration::from_secs(1));

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    // Global quit handler
                    if key.code == KeyCode::Char('q') && key.modifiers.is_empty() {
                        return Ok(());
                    }
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }
                    app.handle_key(key);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            Some(update) = updates.recv() => app.apply_update(update),
            _ = redraw.tick() => {}
        }
    }
}
