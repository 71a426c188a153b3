//! Configuration management for certsearch.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Command-line flags are applied on top of
//! the loaded value by the binary.

use crate::error::{ConfigError, ConfigResult};
use crate::types::MAX_BATCH_SIZE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/certsearch/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend connection settings
    pub database: DatabaseConfig,
    /// Scan pacing settings
    pub scan: ScanConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults
    /// if the file does not exist.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::read(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        Self::read(path)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `CERTSEARCH_DB_HOST`: Override backend host
    /// - `CERTSEARCH_DB_PORT`: Override backend port
    /// - `CERTSEARCH_DB_USER`: Override backend user
    /// - `CERTSEARCH_DB_PASSWORD`: Set a backend password
    /// - `CERTSEARCH_LOG_LEVEL`: Override log level
    /// - `CERTSEARCH_POLL_INTERVAL_SECS`: Override the live-edge polling interval
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `CERTSEARCH_*` overrides using the given variable lookup.
    ///
    /// Values that fail to parse are ignored, matching how an unset variable
    /// is treated.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("CERTSEARCH_DB_HOST") {
            tracing::debug!("Override database.host from env: {}", host);
            self.database.host = host;
        }

        if let Some(port) = lookup("CERTSEARCH_DB_PORT").and_then(|v| v.parse().ok()) {
            tracing::debug!("Override database.port from env: {}", port);
            self.database.port = port;
        }

        if let Some(user) = lookup("CERTSEARCH_DB_USER") {
            tracing::debug!("Override database.user from env: {}", user);
            self.database.user = user;
        }

        if let Some(password) = lookup("CERTSEARCH_DB_PASSWORD") {
            tracing::debug!("Override database.password from env");
            self.database.password = Some(password);
        }

        if let Some(level) = lookup("CERTSEARCH_LOG_LEVEL") {
            tracing::debug!("Override logging.level from env: {}", level);
            self.logging.level = level;
        }

        if let Some(secs) = lookup("CERTSEARCH_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            tracing::debug!("Override scan.poll_interval_secs from env: {}", secs);
            self.scan.poll_interval_secs = secs;
        }
    }

    /// Check value ranges that TOML parsing cannot express.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.host.trim().is_empty() {
            return Err(invalid("database.host", "must not be empty"));
        }

        if self.database.database.trim().is_empty() {
            return Err(invalid("database.database", "must not be empty"));
        }

        if !(1..=MAX_BATCH_SIZE).contains(&self.scan.batch_size) {
            return Err(invalid(
                "scan.batch_size",
                &format!("must be between 1 and {MAX_BATCH_SIZE}"),
            ));
        }

        if self.scan.poll_interval_secs == 0 {
            return Err(invalid("scan.poll_interval_secs", "must be at least 1"));
        }

        self.logging.max_level()?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/certsearch/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("org", "certsearch", "certsearch")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    fn read(path: &Path) -> ConfigResult<Self> {
        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Backend connection settings.
///
/// The defaults point at the public crt.sh replica with its guest account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Server host name
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database name
    pub database: String,
    /// Login role
    pub user: String,
    /// Optional password (never written back out)
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// `application_name` reported to the server
    pub application_name: String,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Prepared statement cache size; 0 describes each statement instead of caching it
    pub statement_cache_capacity: usize,
}

impl DatabaseConfig {
    /// Connection timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "crt.sh".to_string(),
            port: 5432,
            database: "certwatch".to_string(),
            user: "guest".to_string(),
            password: None,
            application_name: "certsearch".to_string(),
            connect_timeout_secs: 30,
            statement_cache_capacity: 0,
        }
    }
}

/// Scan pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of record IDs covered by one batch query
    pub batch_size: i64,
    /// Delay between polls once the scan has caught up with the live edge
    pub poll_interval_secs: u64,
}

impl ScanConfig {
    /// Polling interval as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            poll_interval_secs: 15,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable text
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(invalid(
                "logging.format",
                &format!("expected 'json' or 'pretty', got '{other}'"),
            )),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn, error (fatal and panic map to error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Parse the configured level.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for an unknown level name.
    pub fn max_level(&self) -> ConfigResult<tracing::Level> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "fatal" | "panic" => Ok(tracing::Level::ERROR),
            "warning" => Ok(tracing::Level::WARN),
            other => other.parse().map_err(|_| {
                invalid(
                    "logging.level",
                    &format!("unknown level '{}'", self.level),
                )
            }),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Json,
        }
    }
}
