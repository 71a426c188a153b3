//! Tracing subscriber setup.

use certsearch_core::{ConfigResult, LogFormat, LoggingConfig};
use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Default filter: our crates at `level`, everything else (sqlx included) at warn.
fn default_filter(level: tracing::Level) -> String {
    format!("warn,certsearch={}", level.as_str().to_ascii_lowercase())
}

/// Build the event filter. `RUST_LOG` wins over the configured level.
pub fn build_filter(config: &LoggingConfig) -> ConfigResult<EnvFilter> {
    let level = config.max_level()?;
    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level))))
}

/// Build a subscriber writing to stderr in the configured format.
pub fn build_subscriber(config: &LoggingConfig) -> ConfigResult<Box<dyn Subscriber + Send + Sync>> {
    let registry = tracing_subscriber::registry().with(build_filter(config)?);

    Ok(match config.format {
        LogFormat::Json => Box::new(
            registry.with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            ),
        ),
        LogFormat::Pretty => Box::new(
            registry.with(fmt::layer().with_target(true).with_writer(std::io::stderr)),
        ),
    })
}

/// Run `f` with a temporary subscriber, for work that happens before the
/// configured logging exists (loading the configuration itself).
pub fn with_bootstrap<T>(config: &LoggingConfig, f: impl FnOnce() -> T) -> ConfigResult<T> {
    let subscriber = build_subscriber(config)?;
    Ok(tracing::subscriber::with_default(subscriber, f))
}

/// Install the global subscriber.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(build_subscriber(config)?)?;
    Ok(())
}
