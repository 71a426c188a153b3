//! certsearch Core - Foundation crate for the certsearch scanner.
//!
//! This crate provides shared types, error handling and configuration
//! management that the database, scanner and CLI crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Search options, scan bounds and result records
//!
//! # Example
//!
//! ```rust
//! use certsearch_core::{SanSelector, ScanBounds, SearchConfig, SubjectSelector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let search = SearchConfig::new("%.example.com", SubjectSelector::None, SanSelector::DnsName)?
//!     .with_unexpired_only(true);
//! let bounds = ScanBounds::new(-1, i64::MAX, 100_000)?;
//! assert!(bounds.starts_at_live_edge());
//! assert_eq!(search.pattern(), "%.example.com");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
#[allow(missing_docs)]
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, DatabaseConfig, LogFormat, LoggingConfig, ScanConfig};
pub use error::{CertSearchError, ConfigError, ConfigResult, Result};
pub use types::{
    CertificateMatch, ObjectId, SanSelector, ScanBounds, ScanRange, SearchConfig, SubjectSelector,
    LIVE_EDGE, MAX_BATCH_SIZE,
};
