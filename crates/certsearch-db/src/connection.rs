//! Read-only backend session management.
//!
//! Provides a `ReadOnlyPool` wrapper around `SQLx` that holds exactly one
//! Postgres connection with `default_transaction_read_only` enabled. The
//! backend is a shared public replica, so the scanner never opens more than
//! one session.

use crate::error::{DatabaseError, Result};
use certsearch_core::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres};
use zeroize::Zeroizing;

/// Single-connection, read-only Postgres pool.
///
/// Any password is zeroized on drop.
#[derive(Debug)]
pub struct ReadOnlyPool {
    pool: PgPool,
    _password: Option<Zeroizing<String>>,
}

impl ReadOnlyPool {
    /// Open a session to the configured backend.
    ///
    /// # Errors
    /// Returns `DatabaseError::Open` if the server cannot be reached or
    /// rejects the login within the configured timeout.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let password = config.password.clone().map(Zeroizing::new);
        let connect_options = build_connect_options(config, password.as_deref().map(String::as_str));

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .acquire_timeout(config.connect_timeout())
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                DatabaseError::Open(format!(
                    "could not connect to {}:{}: {e}",
                    config.host, config.port
                ))
            })?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Read-only database session opened"
        );

        Ok(Self {
            pool,
            _password: password,
        })
    }

    /// Wrap an existing pool.
    ///
    /// The caller is responsible for the pool's connection limits and
    /// session settings.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            _password: None,
        }
    }

    /// Get a reference to the underlying `SQLx` pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<Postgres> {
        &self.pool
    }

    /// Close the session gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database session closed");
    }

    /// Verify that the backend answers queries.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Translate configuration into connection options.
///
/// A statement cache capacity of 0 makes `SQLx` describe each statement on
/// every execution instead of keeping named prepared statements on the
/// server.
#[must_use]
pub fn build_connect_options(config: &DatabaseConfig, password: Option<&str>) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .application_name(&config.application_name)
        .statement_cache_capacity(config.statement_cache_capacity)
        .options([("default_transaction_read_only", "on")]);

    if let Some(password) = password {
        options = options.password(password);
    }

    options
}
