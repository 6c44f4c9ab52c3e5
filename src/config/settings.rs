//! Bot settings loading from `config.toml` and the environment.
//!
//! Every field has a default, so a missing file or a missing section is not an
//! error. Super users can also be supplied through the `SUPER_USERS` environment
//! variable (comma separated), which is merged into whatever the file lists.

use crate::core::{sweep::SweepPolicy, window::TimeRange};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General bot settings
    pub bot: BotConfig,
    /// Statistics panel settings
    pub panels: PanelConfig,
    /// Leaderboard settings
    pub leaderboard: LeaderboardConfig,
    /// Ticket lifecycle settings
    pub tickets: TicketConfig,
}

/// `[bot]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Discord user ids allowed to manage live panels
    pub supers: Vec<String>,
}

/// `[panels]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Seconds between panel refreshes
    pub refresh_secs: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self { refresh_secs: 120 }
    }
}

impl PanelConfig {
    /// Refresh period as a `Duration`, never shorter than ten seconds.
    #[must_use]
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(10))
    }
}

/// `[leaderboard]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// How many entries are ranked
    pub limit: usize,
    /// Entries shown per page
    pub page_size: usize,
    /// Seconds without navigation before the controls are removed
    pub idle_timeout_secs: u64,
    /// Window used when the command gives none
    pub default_range: TimeRange,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            page_size: 5,
            idle_timeout_secs: 300,
            default_range: TimeRange::Month,
        }
    }
}

/// `[tickets]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TicketConfig {
    /// Hours after locking before a ticket is scheduled for deletion
    pub lock_deletion_hours: i64,
    /// Prefix of ticket channel names (`<prefix>-<number>`)
    pub channel_prefix: String,
    /// Seconds of silence before an inactivity warning, 0 to disable
    pub stale_after_secs: u64,
    /// Seconds after the warning before the ticket is closed, 0 to disable
    pub auto_close_secs: u64,
    /// Seconds between sweeps
    pub sweep_secs: u64,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            lock_deletion_hours: 48,
            channel_prefix: "ticket".to_string(),
            stale_after_secs: 86_400,
            auto_close_secs: 86_400,
            sweep_secs: 300,
        }
    }
}

fn threshold(secs: u64) -> Option<chrono::Duration> {
    if secs == 0 {
        return None;
    }
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}

impl TicketConfig {
    /// Inactivity thresholds for the sweep.
    #[must_use]
    pub fn sweep_policy(&self) -> SweepPolicy {
        SweepPolicy {
            stale_after: threshold(self.stale_after_secs),
            auto_close_after: threshold(self.auto_close_secs),
        }
    }

    /// Sweep period, never shorter than a minute.
    #[must_use]
    pub fn sweep_period(&self) -> Duration {
        Duration::from_secs(self.sweep_secs.max(60))
    }
}

impl AppConfig {
    /// Whether `user_id` is a configured super user.
    #[must_use]
    pub fn is_super(&self, user_id: &str) -> bool {
        self.bot.supers.iter().any(|s| s == user_id)
    }

    /// Merges a comma separated list of super user ids, skipping blanks and duplicates.
    pub fn merge_supers(&mut self, list: &str) {
        for id in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !self.is_super(id) {
                self.bot.supers.push(id.to_string());
            }
        }
    }
}

/// Parses configuration from a TOML string.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    Ok(toml::from_str(contents)?)
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads the application configuration.
///
/// Reads the file named by `CONFIG_PATH` (default `config.toml`); a missing file
/// yields defaults. `SUPER_USERS` is merged afterwards.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let mut config = if Path::new(&path).exists() {
        load_config(&path)?
    } else {
        tracing::warn!("No configuration file at {path}, using defaults");
        AppConfig::default()
    };

    if let Ok(supers) = std::env::var("SUPER_USERS") {
        config.merge_supers(&supers);
    }

    tracing::info!(
        supers = config.bot.supers.len(),
        refresh_secs = config.panels.refresh_secs,
        "Configuration loaded"
    );
    Ok(config)
}
