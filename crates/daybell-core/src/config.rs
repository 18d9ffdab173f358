use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DaybellError;

/// Top-level Daybell configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daybell: DaybellConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaybellConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaybellConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Persistent store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Foreground scheduler: in-process timers while the app is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Safety-net rebuild interval. Clamped to 1..=60 seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl SchedulerConfig {
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_secs.clamp(1, 60))
    }
}

/// Background agent: wakes on its own and fires what the foreground missed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// How late an entry may still fire.
    #[serde(default = "default_due_window_secs")]
    pub due_window_secs: u64,
    #[serde(default = "default_ledger_retention_days")]
    pub ledger_retention_days: i64,
    #[serde(default = "default_prune_interval_hours")]
    pub prune_interval_hours: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_secs: default_tick_secs(),
            due_window_secs: default_due_window_secs(),
            ledger_retention_days: default_ledger_retention_days(),
            prune_interval_hours: default_prune_interval_hours(),
        }
    }
}

impl AgentConfig {
    pub fn due_window_ms(&self) -> i64 {
        i64::try_from(self.due_window_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    pub fn tick(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_secs.max(1))
    }
}

/// Notification backend selection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyBackend {
    /// Native desktop notifications (notify-send / osascript).
    #[default]
    Desktop,
    /// Log-only delivery for headless hosts.
    Log,
}

impl NotifyBackend {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Desktop => "desktop",
            Self::Log => "log",
        }
    }
}

/// Notification delivery config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub backend: NotifyBackend,
    #[serde(default = "default_true")]
    pub sound: bool,
    /// Subprocess timeout for the platform notifier.
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
    /// Owner name carried alongside schedule pushes.
    #[serde(default)]
    pub username: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            backend: NotifyBackend::default(),
            sound: true,
            timeout_secs: default_notify_timeout(),
            username: None,
        }
    }
}

// --- Default value functions ---

fn default_name() -> String {
    "Daybell".to_string()
}
fn default_data_dir() -> String {
    "~/.daybell".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_db_path() -> String {
    "~/.daybell/daybell.db".to_string()
}
fn default_true() -> bool {
    true
}
fn default_refresh_interval() -> u64 {
    60
}
fn default_tick_secs() -> u64 {
    60
}
fn default_due_window_secs() -> u64 {
    300
}
fn default_ledger_retention_days() -> i64 {
    crate::schedule::LEDGER_RETENTION_DAYS
}
fn default_prune_interval_hours() -> u64 {
    24
}
fn default_notify_timeout() -> u64 {
    10
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, DaybellError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| DaybellError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| DaybellError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
