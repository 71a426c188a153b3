//! Batch statement construction.
//!
//! The statement is composed once from a validated [`SearchConfig`]. Only
//! fixed SQL vocabulary, validated OIDs and integer type codes are written
//! into the text; the free-text pattern is always bound as `$3`.

use certsearch_core::{SanSelector, SearchConfig, SubjectSelector};
use std::fmt::Write as _;

/// Which optional parts ended up in a built statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct QueryClauses {
    /// Subject attribute values are part of the identity expansion
    pub subject_branch: bool,
    /// SAN values are part of the identity expansion
    pub san_branch: bool,
    /// Expired certificates are excluded
    pub unexpired_only: bool,
    /// Later (pre)certificate duplicates are excluded
    pub deduplicate: bool,
    /// Rows are grouped on the projected tuple
    pub grouped: bool,
    /// Rows are ordered by the projected tuple
    pub ordered: bool,
}

/// A parameterized batch statement.
///
/// Parameters: `$1` first record ID, `$2` last record ID, `$3` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchQuery {
    sql: String,
    clauses: QueryClauses,
}

impl BatchQuery {
    /// Statement text, ready to be executed with three bound parameters.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Which optional clauses were included.
    #[must_use]
    pub fn clauses(&self) -> QueryClauses {
        self.clauses
    }

    /// Statement text terminated with `;`, for printing to an operator.
    #[must_use]
    pub fn display_sql(&self) -> String {
        format!("{};", self.sql)
    }
}

const PROJECTION: &str = "c.ID, identities.VALUE, x509_notAfter(c.CERTIFICATE)";

/// Build the batch statement for a search configuration.
///
/// Deterministic: the same configuration always yields the same text.
#[must_use]
pub fn build_batch_query(config: &SearchConfig) -> BatchQuery {
    let mut clauses = QueryClauses::default();
    let mut branches = Vec::with_capacity(2);

    if let Some(branch) = subject_branch(config.subject()) {
        clauses.subject_branch = true;
        branches.push(branch);
    }
    if let Some(branch) = san_branch(config.san()) {
        clauses.san_branch = true;
        branches.push(branch);
    }

    let mut sql = format!(
        "SELECT {PROJECTION}
    FROM certificate c,
        LATERAL (
{}
        ) identities
    WHERE c.ID BETWEEN $1 AND $2
        AND identities.VALUE ILIKE $3",
        branches.join("\n            UNION\n")
    );

    if config.unexpired_only() {
        clauses.unexpired_only = true;
        sql.push_str(
            "
        AND x509_notAfter(c.CERTIFICATE) > now() AT TIME ZONE 'UTC'",
        );
    }

    // Roughly 4x slower: one correlated lookup per candidate row.
    if config.deduplicate() {
        clauses.deduplicate = true;
        sql.push_str(
            "
        AND NOT EXISTS (
            SELECT 1
                FROM certificate c2
                WHERE x509_serialNumber(c2.CERTIFICATE) = x509_serialNumber(c.CERTIFICATE)
                    AND c2.ISSUER_CA_ID = c.ISSUER_CA_ID
                    AND c2.ID < c.ID
                    AND x509_tbscert_strip_ct_ext(c2.CERTIFICATE) = x509_tbscert_strip_ct_ext(c.CERTIFICATE)
                LIMIT 1
        )",
        );
    }

    if config.unique_results() {
        clauses.grouped = true;
        let _ = write!(sql, "\n    GROUP BY {PROJECTION}");
    }

    if config.ordered_output() {
        clauses.ordered = true;
        let _ = write!(sql, "\n    ORDER BY {PROJECTION}");
    }

    BatchQuery { sql, clauses }
}

fn subject_branch(selector: &SubjectSelector) -> Option<String> {
    let mut branch = "            SELECT encode(na.RAW_VALUE, 'escape'::text) AS VALUE
                FROM x509_nameAttributes_raw(c.CERTIFICATE, TRUE) na"
        .to_string();

    match selector {
        SubjectSelector::None => return None,
        SubjectSelector::Any => {}
        // ObjectId only holds dotted-decimal text, so quoting it is safe.
        SubjectSelector::Oid(oid) => {
            let _ = write!(branch, "\n                WHERE na.ATTRIBUTE_OID = '{oid}'");
        }
    }

    Some(branch)
}

fn san_branch(selector: SanSelector) -> Option<String> {
    if !selector.is_enabled() {
        return None;
    }

    let mut branch = "            SELECT encode(an.RAW_VALUE, 'escape'::text) AS VALUE
                FROM x509_altNames_raw(c.CERTIFICATE) an"
        .to_string();

    if let Some(code) = selector.type_code() {
        let _ = write!(branch, "\n                WHERE an.TYPE_NUM = {code}");
    }

    Some(branch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(subject: SubjectSelector, san: SanSelector) -> SearchConfig {
        SearchConfig::new("%.example.com", subject, san).expect("valid search config")
    }

    fn all_flag_combinations(base: &SearchConfig) -> Vec<SearchConfig> {
        (0u8..16)
            .map(|bits| {
                base.clone()
                    .with_unexpired_only(bits & 1 != 0)
                    .with_deduplicate(bits & 2 != 0)
                    .with_unique_results(bits & 4 != 0)
                    .with_ordered_output(bits & 8 != 0)
            })
            .collect()
    }

    #[test]
    fn test_default_search_is_san_dns_only() {
        let query = build_batch_query(&config(SubjectSelector::None, SanSelector::DnsName));

        assert!(query.sql().contains("x509_altNames_raw(c.CERTIFICATE) an"));
        assert!(query.sql().contains("an.TYPE_NUM = 2"));
        assert!(!query.sql().contains("x509_nameAttributes_raw"));
        assert!(!query.sql().contains("UNION"));
        assert_eq!(
            query.clauses(),
            QueryClauses {
                san_branch: true,
                ..QueryClauses::default()
            }
        );
    }

    #[test]
    fn test_subject_oid_only() {
        let subject = SubjectSelector::oid("1.2.3").expect("valid OID");
        let query = build_batch_query(&config(subject, SanSelector::None));

        assert!(query.sql().contains("x509_nameAttributes_raw(c.CERTIFICATE, TRUE) na"));
        assert!(query.sql().contains("na.ATTRIBUTE_OID = '1.2.3'"));
        assert!(!query.sql().contains("x509_altNames_raw"));
        assert!(!query.sql().contains("UNION"));
        assert!(query.clauses().subject_branch);
        assert!(!query.clauses().san_branch);
    }

    #[test]
    fn test_both_branches_are_unioned() {
        let query = build_batch_query(&config(SubjectSelector::Any, SanSelector::Any));

        assert_eq!(query.sql().matches("UNION").count(), 1);
        // ANY selectors carry no filter
        assert!(!query.sql().contains("ATTRIBUTE_OID"));
        assert!(!query.sql().contains("TYPE_NUM"));
    }

    #[test]
    fn test_san_type_codes_in_filter() {
        let cases = [
            (SanSelector::Rfc822Name, "an.TYPE_NUM = 1"),
            (SanSelector::DnsName, "an.TYPE_NUM = 2"),
            (SanSelector::IpAddress, "an.TYPE_NUM = 7"),
        ];

        for (san, expected) in cases {
            let query = build_batch_query(&config(SubjectSelector::None, san));
            assert!(query.sql().contains(expected), "missing {expected} for {san}");
        }
    }

    #[test]
    fn test_parameters_appear_exactly_once() {
        let bases = [
            config(SubjectSelector::None, SanSelector::DnsName),
            config(SubjectSelector::Any, SanSelector::Any),
            config(
                SubjectSelector::oid("2.5.4.3").expect("valid OID"),
                SanSelector::None,
            ),
        ];

        for base in &bases {
            for search in all_flag_combinations(base) {
                let query = build_batch_query(&search);
                for param in ["$1", "$2", "$3"] {
                    assert_eq!(
                        query.sql().matches(param).count(),
                        1,
                        "{param} in {search:?}"
                    );
                }
                assert!(!query.sql().contains("$4"));
            }
        }
    }

    #[test]
    fn test_pattern_is_never_embedded() {
        let search = SearchConfig::new(
            "%'; DELETE FROM certificate; --",
            SubjectSelector::Any,
            SanSelector::Any,
        )
        .expect("valid search config")
        .with_unexpired_only(true)
        .with_deduplicate(true)
        .with_unique_results(true)
        .with_ordered_output(true);

        let query = build_batch_query(&search);
        assert!(!query.sql().contains("DELETE"));
        assert!(!query.sql().contains(search.pattern()));
        assert!(query.sql().contains("ILIKE $3"));
    }

    #[test]
    fn test_only_validated_oids_reach_the_statement() {
        for hostile in ["1' OR '1'='1", "2.5.4.3'--", "2.5.4.3;"] {
            assert!(hostile.parse::<SubjectSelector>().is_err(), "accepted {hostile}");
        }

        let subject: SubjectSelector = "2.5.4.3".parse().expect("valid OID");
        let query = build_batch_query(&config(subject, SanSelector::None));

        // The only other quoted text is the fixed 'escape' encoding name
        let quoted: Vec<&str> = query.sql().split('\'').skip(1).step_by(2).collect();
        assert_eq!(quoted, vec!["escape", "2.5.4.3"]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let search = config(SubjectSelector::Any, SanSelector::DnsName)
            .with_deduplicate(true)
            .with_ordered_output(true);

        assert_eq!(build_batch_query(&search), build_batch_query(&search));
    }

    #[test]
    fn test_optional_clauses_append_independently() {
        let base = config(SubjectSelector::None, SanSelector::DnsName);
        let plain = build_batch_query(&base);
        assert!(!plain.sql().contains("now() AT TIME ZONE 'UTC'"));
        assert!(!plain.sql().contains("NOT EXISTS"));
        assert!(!plain.sql().contains("GROUP BY"));
        assert!(!plain.sql().contains("ORDER BY"));

        let unexpired = build_batch_query(&base.clone().with_unexpired_only(true));
        assert!(unexpired
            .sql()
            .contains("x509_notAfter(c.CERTIFICATE) > now() AT TIME ZONE 'UTC'"));
        assert!(unexpired.clauses().unexpired_only);

        let dedup = build_batch_query(&base.clone().with_deduplicate(true));
        assert!(dedup.sql().contains("AND NOT EXISTS ("));
        assert!(dedup.sql().contains("c2.ISSUER_CA_ID = c.ISSUER_CA_ID"));
        assert!(dedup.sql().contains("x509_tbscert_strip_ct_ext"));
        assert!(dedup.clauses().deduplicate);

        let all = build_batch_query(
            &base
                .with_unexpired_only(true)
                .with_deduplicate(true)
                .with_unique_results(true)
                .with_ordered_output(true),
        );
        let group_at = all.sql().find("GROUP BY").expect("GROUP BY present");
        let order_at = all.sql().find("ORDER BY").expect("ORDER BY present");
        assert!(group_at < order_at);
        assert!(all.clauses().grouped);
        assert!(all.clauses().ordered);
    }

    #[test]
    fn test_display_sql_is_terminated() {
        let query = build_batch_query(&config(SubjectSelector::None, SanSelector::DnsName));
        let text = query.display_sql();

        assert!(text.ends_with(';'));
        assert_eq!(text.trim_end_matches(';'), query.sql());
    }
}
