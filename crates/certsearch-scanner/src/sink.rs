//! Where matched rows go.
//!
//! The scanner's only output is a stream of log records; [`LogSink`] writes
//! one `info` record per match. Other sinks exist for tests and embedding.

use certsearch_core::CertificateMatch;

/// Receives every match, in the order the backend returned it.
pub trait MatchSink: Send {
    /// Handle one matching row.
    fn on_match(&mut self, found: &CertificateMatch);
}

/// Emits each match as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MatchSink for LogSink {
    fn on_match(&mut self, found: &CertificateMatch) {
        tracing::info!(
            certificate_id = found.certificate_id,
            identity = %found.identity,
            not_after = %found.not_after.to_rfc3339(),
            "Record found"
        );
    }
}

/// Keeps every match in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    /// Matches received so far
    pub matches: Vec<CertificateMatch>,
}

impl MatchSink for CollectingSink {
    fn on_match(&mut self, found: &CertificateMatch) {
        self.matches.push(found.clone());
    }
}

impl<F> MatchSink for F
where
    F: FnMut(&CertificateMatch) + Send,
{
    fn on_match(&mut self, found: &CertificateMatch) {
        self(found);
    }
}
