//! certsearch Scheduler - pacing and shutdown for the scan loop.
//!
//! The scan loop never sleeps directly. Every pause goes through
//! [`wait_or_cancelled`], which races the delay against a shared
//! [`CancellationToken`]; [`cancel_on_shutdown`] cancels that token when the
//! process receives SIGINT, SIGTERM or SIGHUP.
//!
//! # Modules
//!
//! - [`throttle`] - wait for a delay or a cancellation, whichever comes first
//! - [`signal`] - turn process termination signals into a `CancellationToken`
//!
//! # Example
//!
//! ```rust,ignore
//! use certsearch_scheduler::{cancel_on_shutdown, wait_or_cancelled, WaitOutcome};
//! use std::time::Duration;
//!
//! let cancel = cancel_on_shutdown();
//! if wait_or_cancelled(Duration::from_secs(15), &cancel).await == WaitOutcome::Cancelled {
//!     return;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod signal;
pub mod throttle;

// Re-export commonly used types
pub use signal::{cancel_on_shutdown, shutdown_signal};
pub use throttle::{wait_or_cancelled, WaitOutcome};
pub use tokio_util::sync::CancellationToken;
