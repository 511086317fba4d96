pub mod error;
pub mod migrations;
pub mod models;
pub mod pooler;
pub mod queries;
pub mod retry;
pub mod store;

#[cfg(any(test, feature = "fake"))]
pub mod memory;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::str::FromStr;

use anyhow::Result;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use tracing::info;

pub use error::DbError;
pub use pooler::{DbTarget, PoolSettings};
pub use retry::{Backoff, retry};
pub use store::{
    AdminCredentials, AmountError, CelebrationChanges, DbResult, NewCelebration, NewWish, Store,
    check_amount,
};

/// How to reach Postgres.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub require_tls: bool,
    /// Retries for the connectivity check at startup.
    pub startup_backoff: Backoff,
}

pub struct Database {
    pool: PgPool,
    query_backoff: Backoff,
}

impl Database {
    /// Build the pool, wait for the server to answer, and run migrations.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let target = pooler::inspect_url(&config.url)?;
        let settings = PoolSettings::for_target(target);

        let mut options = PgConnectOptions::from_str(&config.url)?;
        if config.require_tls {
            options = options.ssl_mode(PgSslMode::Require);
        }
        if !settings.statement_cache {
            options = options.statement_cache_capacity(0);
        }

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .idle_timeout(Some(settings.idle_timeout))
            .connect_lazy_with(options);

        info!(
            "Database target: {:?} (max {} connections, acquire timeout {:?})",
            target, settings.max_connections, settings.acquire_timeout
        );

        let db = Self {
            pool,
            query_backoff: Backoff::for_queries(),
        };

        let pool = &db.pool;
        retry(
            &config.startup_backoff,
            move || async move { sqlx::query("SELECT 1").execute(pool).await.map(|_| ()) },
            error::is_transient,
        )
        .await
        .map_err(|e| anyhow::anyhow!("Database connectivity check failed: {}", e))?;
        info!("Connected to PostgreSQL");

        migrations::run(&db.pool).await?;

        Ok(db)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn seed_admin(&self, email: &str, password_hash: &str) -> Result<bool> {
        migrations::seed_admin(&self.pool, email, password_hash).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run a read, retrying on any transient connection failure.
    async fn read<T, F, Fut>(&self, op: F) -> DbResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        retry(&self.query_backoff, op, error::is_transient)
            .await
            .map_err(DbError::from)
    }

    /// Run a write, retrying only when the pool never handed out a connection.
    async fn write<T, F, Fut>(&self, op: F) -> DbResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        retry(&self.query_backoff, op, error::is_acquire_timeout)
            .await
            .map_err(DbError::from)
    }
}
