//! certsearch Database Layer
//!
//! Provides read-only Postgres access to the crt.sh `certwatch` database.
//!
//! # Architecture
//!
//! - **Session**: one pooled connection with `default_transaction_read_only`
//! - **Statements**: no server-side statement cache, so every batch is described
//!   and executed as a single read-only query
//! - **Seam**: the scanner talks to [`CertificateSource`], so the scan loop can be
//!   driven without a live backend
//!
//! # Example
//!
//! ```ignore
//! use certsearch_core::DatabaseConfig;
//! use certsearch_db::{CertificateSource, CrtShSource, ReadOnlyPool};
//!
//! let pool = ReadOnlyPool::connect(&DatabaseConfig::default()).await?;
//! let source = CrtShSource::new(pool);
//! let newest = source.latest_id().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod source;

// Re-export commonly used types
pub use connection::{build_connect_options, ReadOnlyPool};
pub use error::{DatabaseError, Result};
pub use source::{CertificateSource, CrtShSource, MatchStream, LATEST_ID_SQL};
