//! Database error types.
//!
//! Provides error handling for backend operations using `thiserror`, and the
//! split between failures worth retrying and failures that end a scan.

use thiserror::Error;

/// Database-specific errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open the backend session.
    #[error("failed to open database: {0}")]
    Open(String),

    /// A returned row did not have the expected `(bigint, text, timestamp)` shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Whether retrying the same request later may succeed.
    ///
    /// Everything except a row decoding failure is treated as a property of
    /// the shared backend (overload, dropped connection, statement timeout)
    /// rather than of the data.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Decode(_))
    }
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
