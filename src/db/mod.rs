//! Database layer
//!
//! Audit records are kept in a local SQLite database. Schema changes live in
//! `migrations/` and are applied when the pool is created.

pub mod audit_repository;

pub use audit_repository::{AuditRepository, AuditStore};

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;

/// Database connection pool type
pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool and run pending migrations
pub async fn init_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .with_context(|| format!("Invalid database URL: {}", config.url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect_with(options)
        .await
        .context("Failed to open database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Check that the database answers queries
pub async fn check_health(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Database health check failed")?;
    Ok(())
}
