//! # certsearch
//!
//! Incrementally scans the crt.sh certificate table for certificates whose
//! subject attributes or SANs match a pattern, following the live edge of
//! the table until stopped.

mod cli;
mod logging;

use anyhow::Context;
use certsearch_core::AppConfig;
use certsearch_db::{CrtShSource, ReadOnlyPool};
use certsearch_scanner::{build_batch_query, ScanOrchestrator, ScanPlanner};
use certsearch_scheduler::cancel_on_shutdown;
use clap::Parser;
use cli::Cli;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config loading logs through a subscriber built from the command line alone
    let bootstrap = cli.bootstrap_logging();
    let mut config = logging::with_bootstrap(&bootstrap, || {
        AppConfig::load_with_env(cli.config.as_deref())
    })
    .context("Invalid log level")?
    .context("Failed to load configuration")?;
    cli.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    let search = cli.search_config().context("Invalid search options")?;
    let bounds = cli.scan_bounds(&config).context("Invalid scan bounds")?;

    if cli.show_sql {
        println!("{}", build_batch_query(&search).display_sql());
        return Ok(());
    }

    logging::init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        start_id = bounds.start_id(),
        end_id = bounds.end_id(),
        batch_size = bounds.batch_size(),
        subject_type = %search.subject(),
        san_type = %search.san(),
        "Starting certsearch"
    );

    let pool = ReadOnlyPool::connect(&config.database)
        .await
        .with_context(|| format!("Could not connect to {}:{}", config.database.host, config.database.port))?;
    let source = CrtShSource::new(pool);

    let cancel = cancel_on_shutdown();
    let planner = ScanPlanner::new(bounds).with_poll_interval(config.scan.poll_interval());
    let mut orchestrator = ScanOrchestrator::new(source, &search, planner);

    let outcome = orchestrator.run(&cancel).await;
    orchestrator.into_source().close().await;

    match outcome {
        Ok(report) => {
            info!(
                state = %report.state,
                last_id = ?report.last_processed_id(),
                batches = report.batches,
                matches = report.matches,
                "Scan finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(err = %e, "Scan failed");
            Err(e).context("Scan failed")
        }
    }
}
