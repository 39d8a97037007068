//! Application state and logic

use crossterm::event::{KeyCode, KeyEvent};
use pihole_common::{DashboardView, PiholeConfig, StatsEvent, StatsSnapshot, StatsUpdate, ViewOptions};
use std::time::{Duration, Instant};
use tracing::debug;

/// Application state
pub struct App {
    /// Appliance endpoint, for display
    pub api_url: String,

    /// Current tab
    pub current_tab: Tab,

    /// Latest snapshot copy received from the scheduler
    pub snapshot: StatsSnapshot,

    /// Presentation flags, toggled from the keyboard
    pub options: ViewOptions,

    /// Status messages
    pub messages: Vec<StatusMessage>,

    /// When the last successful update arrived
    pub last_update: Option<Instant>,

    /// Reason of the most recent failed refresh, cleared by the next summary
    pub last_error: Option<String>,

    /// Normal refresh cadence
    pub update_interval: Duration,
}

/// Available tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Help,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Dashboard, Tab::Help]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Help => "Help",
        }
    }
}

/// Status message for display
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl App {
    pub fn new(config: &PiholeConfig) -> Self {
        Self {
            api_url: config.api.api_url.clone(),
            current_tab: Tab::Dashboard,
            snapshot: StatsSnapshot::new(),
            options: ViewOptions::new(&config.sources, &config.display),
            messages: Vec::new(),
            last_update: None,
            last_error: None,
            update_interval: config.refresh.update_interval(),
        }
    }

    /// What the dashboard tab shows right now
    pub fn view(&self) -> DashboardView {
        DashboardView::build(&self.snapshot, self.options)
    }

    /// Take a new snapshot from the scheduler
    pub fn apply_update(&mut self, update: StatsUpdate) {
        debug!("Received: {:?}", update.event);
        let was_loaded = self.snapshot.loaded();

        match update.event {
            StatsEvent::SummaryUpdated(_) => {
                self.last_update = Some(Instant::now());
                self.last_error = None;
                if !was_loaded && update.snapshot.loaded() {
                    self.add_message("Connected to Pi-hole", false);
                }
            }
            StatsEvent::SourcesUpdated(_) => {
                self.last_update = Some(Instant::now());
            }
            StatsEvent::FetchFailed(reason) => {
                self.add_message(&format!("Refresh failed: {}", reason), true);
                self.last_error = Some(reason);
            }
        }

        self.snapshot = update.snapshot;
    }

    /// Add a status message
    pub fn add_message(&mut self, text: &str, is_error: bool) {
        self.messages.push(StatusMessage {
            text: text.to_string(),
            is_error,
        });

        // Keep only last 10 messages
        if self.messages.len() > 10 {
            self.messages.remove(0);
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            // Tab navigation
            KeyCode::Tab => {
                let tabs = Tab::all();
                let current_idx = tabs.iter().position(|&t| t == self.current_tab).unwrap_or(0);
                self.current_tab = tabs[(current_idx + 1) % tabs.len()];
            }
            KeyCode::BackTab => {
                let tabs = Tab::all();
                let current_idx = tabs.iter().position(|&t| t == self.current_tab).unwrap_or(0);
                self.current_tab = tabs[(current_idx + tabs.len() - 1) % tabs.len()];
            }

            // Number keys for direct tab selection
            KeyCode::Char('1') => self.current_tab = Tab::Dashboard,
            KeyCode::Char('2') => self.current_tab = Tab::Help,

            // Presentation toggles
            KeyCode::Char('h') => {
                self.options.hostname_only = !self.options.hostname_only;
                let mode = if self.options.hostname_only {
                    "hostnames only"
                } else {
                    "full client identifiers"
                };
                self.add_message(&format!("Showing {}", mode), false);
            }
            KeyCode::Char('f') => {
                self.options.full_color = !self.options.full_color;
            }

            _ => {}
        }
    }
}
