//! Core error types for certsearch.
//!
//! Every validation failure that can happen before the scan loop starts is
//! reported through [`CertSearchError`], so the binary can exit non-zero with a
//! single, readable message.

use thiserror::Error;

/// Rejected search options or scan bounds.
#[derive(Error, Debug)]
pub enum CertSearchError {
    /// Validation errors (invalid search options, invalid scan bounds)
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file explicitly requested but not found
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `CertSearchError`.
pub type Result<T> = std::result::Result<T, CertSearchError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
