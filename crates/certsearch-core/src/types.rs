//! Shared types used across certsearch.
//!
//! Search options and scan bounds are validated at construction, so the query
//! builder and the scan loop never see an invalid combination.

use crate::error::CertSearchError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Largest number of record IDs a single batch may cover.
pub const MAX_BATCH_SIZE: i64 = 100_000;

/// Start ID sentinel meaning "begin just past the newest record".
pub const LIVE_EDGE: i64 = -1;

/// A dotted-decimal attribute OID such as `2.5.4.3`.
///
/// Only constructible through [`ObjectId::new`] or `FromStr`, so its text is
/// always safe to write into a statement as a quoted literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    /// Validate and wrap an OID.
    ///
    /// # Errors
    /// Returns error if the OID is not dotted-decimal (`^[0-9.]*[0-9]$`).
    pub fn new(oid: impl Into<String>) -> Result<Self, CertSearchError> {
        static OID_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = OID_REGEX.get_or_init(|| Regex::new(r"^[0-9.]*[0-9]$").expect("valid regex"));

        let oid = oid.into();
        if regex.is_match(&oid) {
            Ok(Self(oid))
        } else {
            Err(CertSearchError::Validation(format!(
                "invalid subject type: expected NONE, ANY or a dotted-decimal OID, got '{oid}'"
            )))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = CertSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which subject distinguished-name attributes feed the identity expansion.
///
/// Serialized as its textual form (`NONE`, `ANY` or the OID); deserializing
/// goes through the same validation as parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SubjectSelector {
    /// Subject attributes are not searched.
    None,
    /// Every subject attribute is searched.
    Any,
    /// Only the attribute with this OID is searched.
    Oid(ObjectId),
}

impl SubjectSelector {
    /// Build a selector for a single attribute OID.
    ///
    /// # Errors
    /// Returns error if the OID is not dotted-decimal (`^[0-9.]*[0-9]$`).
    pub fn oid(oid: impl Into<String>) -> Result<Self, CertSearchError> {
        ObjectId::new(oid).map(Self::Oid)
    }

    /// Whether subject attributes take part in the search at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl TryFrom<String> for SubjectSelector {
    type Error = CertSearchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SubjectSelector> for String {
    fn from(selector: SubjectSelector) -> Self {
        selector.to_string()
    }
}

impl FromStr for SubjectSelector {
    type Err = CertSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("none") {
            Ok(Self::None)
        } else if trimmed.eq_ignore_ascii_case("any") {
            Ok(Self::Any)
        } else {
            Self::oid(trimmed)
        }
    }
}

impl fmt::Display for SubjectSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::Any => write!(f, "ANY"),
            Self::Oid(oid) => write!(f, "{oid}"),
        }
    }
}

/// Which Subject Alternative Name entries feed the identity expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SanSelector {
    /// SANs are not searched.
    None,
    /// Every SAN entry is searched, regardless of type.
    Any,
    /// `rfc822Name` (email address) entries.
    Rfc822Name,
    /// `dNSName` entries.
    DnsName,
    /// `iPAddress` entries.
    IpAddress,
}

impl SanSelector {
    /// The `GeneralName` tag number used to filter SAN entries, if any.
    #[must_use]
    pub fn type_code(&self) -> Option<u8> {
        match self {
            Self::Rfc822Name => Some(1),
            Self::DnsName => Some(2),
            Self::IpAddress => Some(7),
            Self::None | Self::Any => None,
        }
    }

    /// Whether SAN entries take part in the search at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for SanSelector {
    fn default() -> Self {
        Self::DnsName
    }
}

impl FromStr for SanSelector {
    type Err = CertSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "ANY" => Ok(Self::Any),
            "RFC822NAME" => Ok(Self::Rfc822Name),
            "DNSNAME" => Ok(Self::DnsName),
            "IPADDRESS" => Ok(Self::IpAddress),
            _ => Err(CertSearchError::Validation(format!(
                "invalid SAN type: expected one of NONE, ANY, rfc822Name, dNSName, iPAddress, got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for SanSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::Any => "ANY",
            Self::Rfc822Name => "rfc822Name",
            Self::DnsName => "dNSName",
            Self::IpAddress => "iPAddress",
        };
        write!(f, "{name}")
    }
}

/// Immutable search options, validated once at startup.
///
/// The pattern uses SQL `LIKE` wildcards (`%`, `_`) and is matched
/// case-insensitively. It is only ever bound as a query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SearchConfig {
    pattern: String,
    subject: SubjectSelector,
    san: SanSelector,
    unexpired_only: bool,
    deduplicate: bool,
    unique_results: bool,
    ordered_output: bool,
}

impl SearchConfig {
    /// Create a search configuration with all optional clauses disabled.
    ///
    /// # Errors
    /// Returns error if the pattern is empty or both selectors are `None`.
    pub fn new(
        pattern: impl Into<String>,
        subject: SubjectSelector,
        san: SanSelector,
    ) -> Result<Self, CertSearchError> {
        let pattern = pattern.into();

        if pattern.is_empty() {
            return Err(CertSearchError::Validation(
                "search pattern must not be empty".to_string(),
            ));
        }

        if !subject.is_enabled() && !san.is_enabled() {
            return Err(CertSearchError::Validation(
                "subject type and SAN type cannot both be NONE".to_string(),
            ));
        }

        Ok(Self {
            pattern,
            subject,
            san,
            unexpired_only: false,
            deduplicate: false,
            unique_results: false,
            ordered_output: false,
        })
    }

    /// Only report certificates that have not yet expired.
    #[must_use]
    pub fn with_unexpired_only(mut self, enabled: bool) -> Self {
        self.unexpired_only = enabled;
        self
    }

    /// Report only the first record of each (pre)certificate pair.
    #[must_use]
    pub fn with_deduplicate(mut self, enabled: bool) -> Self {
        self.deduplicate = enabled;
        self
    }

    /// Collapse identical result tuples.
    #[must_use]
    pub fn with_unique_results(mut self, enabled: bool) -> Self {
        self.unique_results = enabled;
        self
    }

    /// Order each batch by the projected tuple.
    #[must_use]
    pub fn with_ordered_output(mut self, enabled: bool) -> Self {
        self.ordered_output = enabled;
        self
    }

    /// The `LIKE`-style search pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The subject attribute selector.
    #[must_use]
    pub fn subject(&self) -> &SubjectSelector {
        &self.subject
    }

    /// The SAN selector.
    #[must_use]
    pub fn san(&self) -> SanSelector {
        self.san
    }

    #[must_use]
    pub fn unexpired_only(&self) -> bool {
        self.unexpired_only
    }

    #[must_use]
    pub fn deduplicate(&self) -> bool {
        self.deduplicate
    }

    #[must_use]
    pub fn unique_results(&self) -> bool {
        self.unique_results
    }

    #[must_use]
    pub fn ordered_output(&self) -> bool {
        self.ordered_output
    }
}

/// Caller-supplied limits of a scan over the record-ID keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanBounds {
    start_id: i64,
    end_id: i64,
    batch_size: i64,
}

impl ScanBounds {
    /// Validate and build scan bounds.
    ///
    /// `start_id` may be [`LIVE_EDGE`] to skip all records that exist when the
    /// scan begins. `end_id` is the inclusive ceiling.
    ///
    /// # Errors
    /// Returns error if `start_id < -1`, `start_id > end_id`, or the batch size
    /// is outside `1..=MAX_BATCH_SIZE`.
    pub fn new(start_id: i64, end_id: i64, batch_size: i64) -> Result<Self, CertSearchError> {
        if start_id < LIVE_EDGE {
            return Err(CertSearchError::Validation(format!(
                "invalid start ID {start_id}: must be -1 (live edge) or a record ID"
            )));
        }

        if start_id > end_id {
            return Err(CertSearchError::Validation(format!(
                "start ID {start_id} is greater than end ID {end_id}"
            )));
        }

        if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(CertSearchError::Validation(format!(
                "invalid batch size {batch_size}: must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }

        Ok(Self {
            start_id,
            end_id,
            batch_size,
        })
    }

    #[must_use]
    pub fn start_id(&self) -> i64 {
        self.start_id
    }

    #[must_use]
    pub fn end_id(&self) -> i64 {
        self.end_id
    }

    #[must_use]
    pub fn batch_size(&self) -> i64 {
        self.batch_size
    }

    /// Whether the scan begins at the live edge rather than a fixed ID.
    #[must_use]
    pub fn starts_at_live_edge(&self) -> bool {
        self.start_id == LIVE_EDGE
    }
}

impl Default for ScanBounds {
    fn default() -> Self {
        Self {
            start_id: LIVE_EDGE,
            end_id: i64::MAX,
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

/// Inclusive range of record IDs covered by one batch query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanRange {
    start: i64,
    end: i64,
}

impl ScanRange {
    /// Create a range covering `start..=end`.
    ///
    /// # Errors
    /// Returns error if `start > end`.
    pub fn new(start: i64, end: i64) -> Result<Self, CertSearchError> {
        if start > end {
            return Err(CertSearchError::Validation(format!(
                "invalid scan range: start {start} is past end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Number of record IDs covered, always at least 1.
    #[must_use]
    pub fn width(&self) -> i64 {
        self.end - self.start + 1
    }
}

impl fmt::Display for ScanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// One matching (certificate, identity) row returned by a batch query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateMatch {
    /// crt.sh certificate ID
    pub certificate_id: i64,
    /// The subject attribute or SAN value that matched
    pub identity: String,
    /// Certificate `notAfter`, in UTC
    pub not_after: DateTime<Utc>,
}
