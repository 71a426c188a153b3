//! Scan orchestrator for walking the certificate table.
//!
//! This module provides the `ScanOrchestrator`, which drives one strictly
//! sequential scan: discover the live edge, query one bounded range, emit the
//! matches, then decide whether to continue immediately or wait.

use crate::error::{Result, ScanError};
use crate::planner::{RangePlan, ScanCursor, ScanPlanner};
use crate::query::{build_batch_query, BatchQuery};
use crate::sink::{LogSink, MatchSink};
use certsearch_core::{ScanRange, SearchConfig};
use certsearch_db::{CertificateSource, DatabaseError};
use certsearch_scheduler::{wait_or_cancelled, CancellationToken, WaitOutcome};
use futures::StreamExt;
use std::fmt;
use tracing::{debug, error, info};

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// The cursor passed the configured ceiling.
    Completed,
    /// Cancellation was observed at a throttle point.
    Stopped,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Summary of a finished scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Terminal state
    pub state: ScanState,
    /// Cursor at exit; restart at `last_processed_id + 1` to resume
    pub cursor: ScanCursor,
    /// Number of batch queries that completed
    pub batches: u64,
    /// Number of matches emitted
    pub matches: u64,
}

impl ScanReport {
    /// Last record ID whose batch was fully processed.
    #[must_use]
    pub fn last_processed_id(&self) -> Option<i64> {
        self.cursor.last_processed_id()
    }
}

/// Drives one scan against a [`CertificateSource`].
pub struct ScanOrchestrator<S, K = LogSink> {
    /// Backend holding the certificate table
    source: S,
    /// Statement reused by every batch
    query: BatchQuery,
    /// Bound as `$3`
    pattern: String,
    /// Range sizing rules
    planner: ScanPlanner,
    /// Receives matches
    sink: K,
    batches: u64,
    matches: u64,
}

impl<S: CertificateSource> ScanOrchestrator<S, LogSink> {
    /// Create a new orchestrator that logs every match.
    #[must_use]
    pub fn new(source: S, search: &SearchConfig, planner: ScanPlanner) -> Self {
        Self {
            source,
            query: build_batch_query(search),
            pattern: search.pattern().to_string(),
            planner,
            sink: LogSink,
            batches: 0,
            matches: 0,
        }
    }
}

impl<S: CertificateSource, K: MatchSink> ScanOrchestrator<S, K> {
    /// Replace the match sink.
    #[must_use]
    pub fn with_sink<K2: MatchSink>(self, sink: K2) -> ScanOrchestrator<S, K2> {
        ScanOrchestrator {
            source: self.source,
            query: self.query,
            pattern: self.pattern,
            planner: self.planner,
            sink,
            batches: self.batches,
            matches: self.matches,
        }
    }

    /// The statement executed for every batch.
    #[must_use]
    pub fn query(&self) -> &BatchQuery {
        &self.query
    }

    #[must_use]
    pub fn planner(&self) -> &ScanPlanner {
        &self.planner
    }

    #[must_use]
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Give back the source, e.g. to close its connection.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Run from the planner's start position until completion, cancellation
    /// or an unrecoverable decoding error.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<ScanReport> {
        let cursor = self.planner.start();
        self.run_from(cursor, cancel).await
    }

    /// Run from an explicit cursor.
    ///
    /// Cancellation is only observed between iterations; a query in flight
    /// is allowed to finish first.
    pub async fn run_from(
        &mut self,
        mut cursor: ScanCursor,
        cancel: &CancellationToken,
    ) -> Result<ScanReport> {
        while !self.planner.is_finished(&cursor) {
            if !cursor.delay().is_zero() {
                debug!(sleep_for = ?cursor.delay(), "Sleeping");
            }

            if wait_or_cancelled(cursor.delay(), cancel).await == WaitOutcome::Cancelled {
                info!(last = ?cursor.last_processed_id(), "Interrupted");
                return Ok(self.report(ScanState::Stopped, cursor));
            }

            cursor = self.step(cursor).await?;
        }

        info!(last = ?cursor.last_processed_id(), "Reached end ID");
        Ok(self.report(ScanState::Completed, cursor))
    }

    /// Perform one iteration without throttling.
    ///
    /// Backend failures are logged and leave the cursor where it was, with
    /// the polling interval as its next delay. Only a row that cannot be
    /// decoded is returned as an error.
    pub async fn step(&mut self, cursor: ScanCursor) -> Result<ScanCursor> {
        let mut cursor = cursor.with_delay(self.planner.poll_interval());

        if self.planner.needs_discovery(&cursor) {
            match self.source.latest_id().await {
                Ok(latest_id) => {
                    debug!(latest_id, "Obtained latest ID");
                    cursor = self.planner.observe_latest(cursor, latest_id);
                }
                Err(e) => {
                    error!(err = %e, "Could not obtain latest ID");
                    return Ok(cursor);
                }
            }
        }

        let RangePlan::Batch { range, delay_after } = self.planner.plan(&cursor) else {
            debug!(next_id = cursor.next_id(), "No more certificates available yet");
            return Ok(cursor);
        };

        debug!(first = range.start(), last = range.end(), "Batch start");

        let count = match self.fetch(range).await {
            Ok(count) => count,
            Err(e) if e.is_transient() => {
                error!(err = %e, first = range.start(), last = range.end(), "Could not obtain batch of results");
                return Ok(cursor);
            }
            Err(e) => {
                error!(err = %e, first = range.start(), last = range.end(), "Could not scan result");
                return Err(ScanError::Decode { range, source: e });
            }
        };

        self.batches += 1;
        self.matches += count;
        debug!(first = range.start(), last = range.end(), count, "Batch end");

        Ok(cursor.advanced_past(range).with_delay(delay_after))
    }

    /// Stream one batch into the sink, returning the number of matches.
    ///
    /// Rows from an attempt that fails partway have already reached the sink
    /// but are not counted; the retry counts them once.
    async fn fetch(&mut self, range: ScanRange) -> std::result::Result<u64, DatabaseError> {
        let mut rows = self
            .source
            .fetch_batch(self.query.sql(), range, &self.pattern);

        let mut count = 0;
        while let Some(row) = rows.next().await {
            let found = row?;
            self.sink.on_match(&found);
            count += 1;
        }

        Ok(count)
    }

    fn report(&self, state: ScanState, cursor: ScanCursor) -> ScanReport {
        ScanReport {
            state,
            cursor,
            batches: self.batches,
            matches: self.matches,
        }
    }
}

impl<S, K> fmt::Debug for ScanOrchestrator<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOrchestrator")
            .field("planner", &self.planner)
            .field("clauses", &self.query.clauses())
            .field("batches", &self.batches)
            .field("matches", &self.matches)
            .finish_non_exhaustive()
    }
}
