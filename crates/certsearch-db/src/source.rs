//! The certificate table as seen by the scanner.
//!
//! [`CertificateSource`] is the seam between the scan loop and the backend:
//! it only needs the newest record ID and a way to stream the matches of one
//! batch statement. [`CrtShSource`] implements it against Postgres.

use crate::connection::ReadOnlyPool;
use crate::error::{DatabaseError, Result};
use async_trait::async_trait;
use certsearch_core::{CertificateMatch, ScanRange};
use chrono::NaiveDateTime;
use futures::stream::{BoxStream, StreamExt};
use sqlx::postgres::PgRow;
use sqlx::Row;

/// Query used to discover the live edge of the certificate table.
pub const LATEST_ID_SQL: &str = "SELECT max(ID) FROM certificate";

/// Stream of matches produced by one batch query.
pub type MatchStream<'a> = BoxStream<'a, Result<CertificateMatch>>;

/// Read-only view of an append-only certificate table.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Return the highest record ID currently present, or `-1` if the table
    /// is empty.
    async fn latest_id(&self) -> Result<i64>;

    /// Execute a batch statement with parameters `(range.start, range.end, pattern)`.
    ///
    /// Rows that cannot be decoded surface as `DatabaseError::Decode` items.
    fn fetch_batch<'a>(
        &'a self,
        statement: &'a str,
        range: ScanRange,
        pattern: &'a str,
    ) -> MatchStream<'a>;
}

/// `CertificateSource` backed by the crt.sh `certwatch` database.
#[derive(Debug)]
pub struct CrtShSource {
    pool: ReadOnlyPool,
}

impl CrtShSource {
    /// Create a source over an open session.
    #[must_use]
    pub fn new(pool: ReadOnlyPool) -> Self {
        Self { pool }
    }

    /// Tear down the backend session.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CertificateSource for CrtShSource {
    async fn latest_id(&self) -> Result<i64> {
        let latest: Option<i64> = sqlx::query_scalar(LATEST_ID_SQL)
            .fetch_one(self.pool.pool())
            .await?;

        Ok(latest.unwrap_or(-1))
    }

    fn fetch_batch<'a>(
        &'a self,
        statement: &'a str,
        range: ScanRange,
        pattern: &'a str,
    ) -> MatchStream<'a> {
        sqlx::query(statement)
            .bind(range.start())
            .bind(range.end())
            .bind(pattern)
            .fetch(self.pool.pool())
            .map(|row| decode_match(&row?))
            .boxed()
    }
}

/// Interpret one result row as `(certificate_id, identity, not_after)`.
fn decode_match(row: &PgRow) -> Result<CertificateMatch> {
    let certificate_id: i64 = row
        .try_get(0)
        .map_err(|e| DatabaseError::Decode(format!("certificate ID: {e}")))?;
    let identity: String = row
        .try_get(1)
        .map_err(|e| DatabaseError::Decode(format!("identity value: {e}")))?;
    let not_after: NaiveDateTime = row
        .try_get(2)
        .map_err(|e| DatabaseError::Decode(format!("notAfter: {e}")))?;

    Ok(CertificateMatch {
        certificate_id,
        identity,
        not_after: not_after.and_utc(),
    })
}
