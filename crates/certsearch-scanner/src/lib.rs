//! certsearch Scanner - incremental certificate table scanning.
//!
//! This crate walks the crt.sh certificate table in bounded, sequential ID
//! ranges and reports certificates whose subject attributes or Subject
//! Alternative Names match a pattern.
//!
//! # Features
//!
//! - One parameterized statement built from orthogonal search options
//! - Batch sizing that runs at full width while behind and polls once caught up
//! - Live-edge start and gap-free resumption from an explicit start ID
//! - Cooperative cancellation between iterations
//!
//! # Example
//!
//! ```rust,ignore
//! use certsearch_scanner::{ScanOrchestrator, ScanPlanner};
//!
//! let planner = ScanPlanner::new(bounds);
//! let mut orchestrator = ScanOrchestrator::new(source, &search, planner);
//! let report = orchestrator.run(&cancel).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
pub mod orchestrator;
#[allow(missing_docs)]
pub mod planner;
pub mod query;
pub mod sink;

// Re-export commonly used types
pub use error::{Result, ScanError};
pub use orchestrator::{ScanOrchestrator, ScanReport, ScanState};
pub use planner::{RangePlan, ScanCursor, ScanPlanner, DEFAULT_POLL_INTERVAL};
pub use query::{build_batch_query, BatchQuery, QueryClauses};
pub use sink::{CollectingSink, LogSink, MatchSink};
