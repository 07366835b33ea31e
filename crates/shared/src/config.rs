//! Configuration management for the anime catalog.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory settings
    pub data: DataConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Favorites store settings
    #[serde(default)]
    pub favorites: FavoritesConfig,

    /// Remote catalog API settings
    pub api: ApiConfig,

    /// Interactive browsing settings
    #[serde(default)]
    pub browse: BrowseConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory path
    pub root_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path (relative to data directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// Favorites store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesConfig {
    /// SQLite file path (relative to data directory or absolute)
    pub path: String,
}

/// Jikan API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Jikan API base URL
    pub base_url: String,

    /// Items requested per list page
    pub page_limit: u32,

    /// Items requested for the top list
    pub top_limit: u32,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,

    /// Retry settings for throttled requests
    pub retry: RetryConfig,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum spacing between two outbound requests, in milliseconds
    pub min_interval_ms: u64,
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retries after a throttled response
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubled on each retry)
    pub retry_delay_ms: u64,
}

/// Browsing behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    /// Quiet period before typed input becomes a query, in milliseconds
    pub debounce_ms: u64,

    /// Minimum spacing between two next-page triggers, in milliseconds
    pub pagination_cooldown_ms: u64,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            path: "favorites.db".to_string(),
        }
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            pagination_cooldown_ms: 1200,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jikan.moe/v4".to_string(),
            page_limit: 24,
            top_limit: 10,
            timeout_secs: 30,
            user_agent: "anime-catalog/0.1.0".to_string(),
            rate_limit: RateLimitConfig {
                min_interval_ms: 1800,
            },
            retry: RetryConfig {
                max_retries: 3,
                retry_delay_ms: 1000,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                root_dir: "data".to_string(),
            },
            logging: LoggingConfig {
                log_dir: "logs".to_string(),
                default_level: "info".to_string(),
                console: true,
                file: true,
                json_format: false,
            },
            favorites: FavoritesConfig::default(),
            api: ApiConfig::default(),
            browse: BrowseConfig::default(),
        }
    }
}

impl ApiConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit.min_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl BrowseConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn pagination_cooldown(&self) -> Duration {
        Duration::from_millis(self.pagination_cooldown_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Get the path for the data directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.root_dir)
    }

    /// Get the absolute path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        self.resolve(&self.logging.log_dir)
    }

    /// Get the absolute path for the favorites database
    pub fn favorites_path(&self) -> PathBuf {
        self.resolve(&self.favorites.path)
    }

    fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir().join(path)
        }
    }
}
