//! Command-line arguments.

use certsearch_core::{
    AppConfig, LogFormat, LoggingConfig, SanSelector, ScanBounds, SearchConfig, SubjectSelector, LIVE_EDGE,
};
use clap::Parser;
use std::path::PathBuf;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "certsearch", version)]
#[command(about = "Scan the crt.sh certificate table for identities matching a pattern")]
pub struct Cli {
    /// crt.sh ID to start from (-1 = begin just past the newest record)
    #[arg(long, default_value_t = LIVE_EDGE, allow_negative_numbers = true)]
    pub start_id: i64,

    /// crt.sh ID to stop at (inclusive)
    #[arg(long, default_value_t = i64::MAX)]
    pub end_id: i64,

    /// Number of record IDs to cover per batch (overrides config)
    #[arg(long)]
    pub batch_size: Option<i64>,

    /// Ignore expired certificates
    #[arg(long)]
    pub unexpired_only: bool,

    /// Report first record only for (pre)certificate pairs (about 4x slower)
    #[arg(long)]
    pub deduplicate: bool,

    /// Collapse duplicate result rows
    #[arg(long)]
    pub uniq: bool,

    /// Order result rows within each batch
    #[arg(long)]
    pub sort: bool,

    /// Search term, matched case-insensitively (% and _ are wildcards)
    #[arg(short, long, default_value = "%")]
    pub query: String,

    /// Subject attributes to search: NONE, ANY or a dotted-decimal OID
    #[arg(long, default_value = "NONE")]
    pub subject_type: SubjectSelector,

    /// SAN entries to search: NONE, ANY, rfc822Name, dNSName or iPAddress
    #[arg(long, default_value = "dNSName")]
    pub san_type: SanSelector,

    /// Print the batch statement and exit without connecting
    #[arg(long)]
    pub show_sql: bool,

    /// Log level: trace, debug, info, warn, error (overrides config)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format: json or pretty (overrides config)
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Path to a TOML configuration file
    #[arg(long, env = "CERTSEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database host (overrides config)
    #[arg(long)]
    pub db_host: Option<String>,

    /// Database port (overrides config)
    #[arg(long)]
    pub db_port: Option<u16>,

    /// Seconds to wait between polls once caught up (overrides config)
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,
}

impl Cli {
    /// Fold command-line overrides into a loaded configuration.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(host) = &self.db_host {
            config.database.host.clone_from(host);
        }
        if let Some(port) = self.db_port {
            config.database.port = port;
        }
        if let Some(batch_size) = self.batch_size {
            config.scan.batch_size = batch_size;
        }
        if let Some(secs) = self.poll_interval_secs {
            config.scan.poll_interval_secs = secs;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }

    /// Logging settings taken from the command line only, with defaults for
    /// anything not given.
    #[must_use]
    pub fn bootstrap_logging(&self) -> LoggingConfig {
        let mut logging = LoggingConfig::default();
        if let Some(level) = &self.log_level {
            logging.level.clone_from(level);
        }
        if let Some(format) = self.log_format {
            logging.format = format;
        }
        logging
    }

    /// Validated search options.
    pub fn search_config(&self) -> certsearch_core::Result<SearchConfig> {
        Ok(
            SearchConfig::new(&self.query, self.subject_type.clone(), self.san_type)?
                .with_unexpired_only(self.unexpired_only)
                .with_deduplicate(self.deduplicate)
                .with_unique_results(self.uniq)
                .with_ordered_output(self.sort),
        )
    }

    /// Validated scan bounds, using the configured batch size.
    pub fn scan_bounds(&self, config: &AppConfig) -> certsearch_core::Result<ScanBounds> {
        ScanBounds::new(self.start_id, self.end_id, config.scan.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["certsearch"]);

        assert_eq!(cli.start_id, LIVE_EDGE);
        assert_eq!(cli.end_id, i64::MAX);
        assert_eq!(cli.query, "%");
        assert_eq!(cli.subject_type, SubjectSelector::None);
        assert_eq!(cli.san_type, SanSelector::DnsName);
        assert!(!cli.show_sql);
    }

    #[test]
    fn test_negative_start_id() {
        let cli = Cli::parse_from(["certsearch", "--start-id", "-1", "--end-id", "500"]);
        assert_eq!(cli.start_id, -1);
        assert_eq!(cli.end_id, 500);
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::parse_from([
            "certsearch",
            "--db-host",
            "localhost",
            "--db-port",
            "5433",
            "--batch-size",
            "500",
            "--poll-interval-secs",
            "2",
            "--log-level",
            "info",
            "--log-format",
            "pretty",
        ]);
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5433);
        assert_eq!(config.scan.batch_size, 500);
        assert_eq!(config.scan.poll_interval_secs, 2);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bootstrap_logging_uses_flags() {
        let cli = Cli::parse_from(["certsearch", "--log-level", "warn", "--log-format", "pretty"]);
        let logging = cli.bootstrap_logging();
        assert_eq!(logging.level, "warn");
        assert_eq!(logging.format, LogFormat::Pretty);

        let defaults = Cli::parse_from(["certsearch"]).bootstrap_logging();
        assert_eq!(defaults.level, LoggingConfig::default().level);
    }

    #[test]
    fn test_unset_overrides_keep_config() {
        let cli = Cli::parse_from(["certsearch"]);
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(config.database.host, "crt.sh");
        assert_eq!(config.scan.batch_size, 100_000);
    }

    #[test]
    fn test_search_config_flags() {
        let cli = Cli::parse_from([
            "certsearch",
            "-q",
            "%.example.com",
            "--subject-type",
            "2.5.4.3",
            "--san-type",
            "ANY",
            "--unexpired-only",
            "--deduplicate",
            "--uniq",
            "--sort",
        ]);
        let search = cli.search_config().expect("valid search");

        assert_eq!(search.pattern(), "%.example.com");
        assert_eq!(search.subject().to_string(), "2.5.4.3");
        assert_eq!(search.san(), SanSelector::Any);
        assert!(search.unexpired_only());
        assert!(search.deduplicate());
        assert!(search.unique_results());
        assert!(search.ordered_output());
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        assert!(Cli::try_parse_from(["certsearch", "--subject-type", "CN"]).is_err());
        assert!(Cli::try_parse_from(["certsearch", "--san-type", "uri"]).is_err());
    }

    #[test]
    fn test_no_identity_source_is_rejected() {
        let cli = Cli::parse_from(["certsearch", "--subject-type", "NONE", "--san-type", "NONE"]);
        assert!(cli.search_config().is_err());
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let cli = Cli::parse_from(["certsearch", "--start-id", "10", "--end-id", "5"]);
        assert!(cli.scan_bounds(&AppConfig::default()).is_err());
    }
}
