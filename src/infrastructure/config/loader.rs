use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use reqwest::Url;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid base_url: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid service_path: {0:?}. Must start with '/'")]
    InvalidServicePath(String),

    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .feed-relevance/config.yaml (project config)
    /// 3. .feed-relevance/local.yaml (local overrides, optional)
    /// 4. Environment variables (FEED_RELEVANCE_* prefix, highest priority)
    pub fn load() -> Result<Config, ConfigError> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".feed-relevance/config.yaml"))
            .merge(Yaml::file(".feed-relevance/local.yaml"))
            .merge(Env::prefixed("FEED_RELEVANCE_").split("__"))
            .extract()
            .map_err(Box::new)?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config, ConfigError> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .map_err(Box::new)?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if let Some(base_url) = &config.remote.base_url {
            Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        }

        if !config.remote.service_path.starts_with('/') {
            return Err(ConfigError::InvalidServicePath(
                config.remote.service_path.clone(),
            ));
        }

        if config.remote.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.remote.timeout_secs));
        }

        Ok(())
    }
}
