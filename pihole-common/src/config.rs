//! Configuration types for the Pi-hole stats dashboard

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PiholeConfig {
    /// Appliance API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Top sources (client table) settings
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Refresh cadence
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Rendering settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Appliance API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Endpoint of the appliance's `api.php`
    #[serde(default = "default_api_url", alias = "apiURL", alias = "apiUrl")]
    pub api_url: String,

    /// API token sent as the `auth` query parameter (empty = none)
    #[serde(default, alias = "apiKey")]
    pub api_key: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout", alias = "requestTimeout")]
    pub request_timeout: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Top sources configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Fetch and show the top clients table
    #[serde(default = "default_true", alias = "showSources")]
    pub show_sources: bool,

    /// Number of clients requested from the appliance
    #[serde(default = "default_sources_count", alias = "sourcesCount")]
    pub sources_count: u32,

    /// Show only the part of the client identifier before the first `|`
    #[serde(default = "default_true", alias = "showSourceHostnameOnly")]
    pub show_source_hostname_only: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            show_sources: true,
            sources_count: default_sources_count(),
            show_source_hostname_only: true,
        }
    }
}

/// Refresh cadence, all values in milliseconds
///
/// ```toml
/// [refresh]
/// update_interval = 600000   # normal cadence after a successful cycle
/// retry_delay = 30000        # backoff after a failed cycle
/// initial_load_delay = 0     # delay before the very first fetch
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_update_interval", alias = "updateInterval")]
    pub update_interval: u64,

    #[serde(default = "default_retry_delay", alias = "retryDelay")]
    pub retry_delay: u64,

    #[serde(default, alias = "initialLoadDelay")]
    pub initial_load_delay: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            update_interval: default_update_interval(),
            retry_delay: default_retry_delay(),
            initial_load_delay: 0,
        }
    }
}

impl RefreshConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }

    pub fn initial_load_delay(&self) -> Duration {
        Duration::from_millis(self.initial_load_delay)
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Fill tiles with their accent colour instead of colouring only the icon
    #[serde(default = "default_true", alias = "fullColor")]
    pub full_color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { full_color: true }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append logs to this file instead of the default sink
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

// Default value functions
fn default_api_url() -> String {
    "http://pi.hole/admin/api.php".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_sources_count() -> u32 {
    10
}

fn default_update_interval() -> u64 {
    10 * 60 * 1000
}

fn default_retry_delay() -> u64 {
    30 * 1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PiholeConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Convert to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Reject values the scheduler and client cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api_url cannot be empty".to_string(),
            ));
        }
        if self.api.request_timeout == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout must be greater than 0".to_string(),
            ));
        }
        if self.sources.sources_count == 0 {
            return Err(ConfigError::ValidationError(
                "sources_count must be greater than 0".to_string(),
            ));
        }
        if self.refresh.update_interval == 0 {
            return Err(ConfigError::ValidationError(
                "update_interval must be greater than 0".to_string(),
            ));
        }
        if self.refresh.retry_delay == 0 {
            return Err(ConfigError::ValidationError(
                "retry_delay must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
