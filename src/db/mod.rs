//! Database connection and operations

pub mod schema_sync;
pub mod sqlite_helpers;
pub mod users;

use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use schema_sync::SchemaSyncResult;
pub use users::{CreateUser, SavedBook, UserRecord, UsersRepository};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `url`, creating the database file (and its directory) if missing.
    /// In-memory databases are limited to a single, never-recycled connection so that
    /// every query sees the same data.
    pub async fn connect_with_options(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            if let Some(parent) = options.get_filename().parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
            pool_options = pool_options.max_connections(max_connections.max(1));
        }

        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Connect, retrying once a second until `timeout` has elapsed
    pub async fn connect_with_retry(
        url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let deadline = Instant::now() + timeout;
        loop {
            match Self::connect_with_options(url, max_connections).await {
                Ok(db) => return Ok(db),
                Err(e) if Instant::now() < deadline => {
                    tracing::warn!(error = %e, "Database connection failed, retrying in 1s");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Err(e) => return Err(e).context("Database connection timed out"),
            }
        }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a users repository
    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone())
    }

    /// Create missing tables
    pub async fn migrate(&self) -> Result<SchemaSyncResult> {
        Ok(schema_sync::sync_all_schemas(&self.pool).await?)
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) async fn test_database() -> Database {
    let db = Database::connect_with_options("sqlite::memory:", 1)
        .await
        .expect("in-memory database");
    db.migrate().await.expect("schema sync");
    db
}
