use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the relevance engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Remote relevance service
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Feed observation tuning
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote relevance service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoteConfig {
    /// Explicit service base URL. When unset the base is derived from the page origin.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Path appended to the page origin to reach the service
    #[serde(default = "default_service_path")]
    pub service_path: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_service_path() -> String {
    "/rest/datacollector".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            service_path: default_service_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Feed observation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WatcherConfig {
    /// A mutation batch triggers a scan only when it inserts more nodes than this
    #[serde(default = "default_insert_threshold")]
    pub insert_threshold: usize,

    /// Wait after a "new activity submitted" signal before re-attaching to the container
    #[serde(default = "default_reattach_delay_ms")]
    pub reattach_delay_ms: u64,
}

const fn default_insert_threshold() -> usize {
    3
}

const fn default_reattach_delay_ms() -> u64 {
    1000
}

impl WatcherConfig {
    pub const fn reattach_delay(&self) -> Duration {
        Duration::from_millis(self.reattach_delay_ms)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            insert_threshold: default_insert_threshold(),
            reattach_delay_ms: default_reattach_delay_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for daily-rotated JSON log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
