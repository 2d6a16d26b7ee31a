//! Database service: owns the SQLite pool lifecycle (start/stop/health).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::Database;
use crate::services::manager::{Service, ServiceHealth};

/// Configuration for the database service.
#[derive(Debug, Clone)]
pub struct DatabaseServiceConfig {
    /// SQLite connection URL (e.g. `sqlite:./data/bookshelf.db` or `sqlite::memory:`).
    pub database_url: String,
    pub max_connections: u32,
    /// How long to retry connecting before giving up.
    pub connect_timeout: Duration,
}

impl Default for DatabaseServiceConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/bookshelf.db".to_string(),
            max_connections: 10,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Service that owns the database pool. Start syncs the schema; stop closes the pool.
pub struct DatabaseService {
    pool: Database,
}

impl DatabaseService {
    /// Wrap an already-connected pool.
    pub fn new(pool: Database) -> Self {
        Self { pool }
    }

    /// Connect (with retry) and wrap the pool.
    pub async fn from_config(config: DatabaseServiceConfig) -> Result<Self> {
        let pool = Database::connect_with_retry(
            &config.database_url,
            config.max_connections,
            config.connect_timeout,
        )
        .await
        .context("Database service: connect_with_retry failed")?;
        Ok(Self::new(pool))
    }

    /// Access the pool (e.g. to clone for app state). Valid until [Service::stop] is called.
    pub fn pool(&self) -> &Database {
        &self.pool
    }
}

#[async_trait]
impl Service for DatabaseService {
    fn name(&self) -> &str {
        "database"
    }

    async fn start(&self) -> Result<()> {
        info!(service = "database", "Database service starting");
        if !self.pool.ping().await {
            anyhow::bail!("database did not answer SELECT 1");
        }

        info!(service = "database", "Syncing schema");
        let sync_result = self.pool.migrate().await?;
        if !sync_result.tables_created.is_empty() {
            info!(
                service = "database",
                tables = ?sync_result.tables_created,
                "Created tables"
            );
        }
        for err in &sync_result.errors {
            warn!(service = "database", error = %err, "Schema sync error");
        }
        if !sync_result.errors.is_empty() {
            anyhow::bail!("schema sync failed with {} error(s)", sync_result.errors.len());
        }

        info!(service = "database", "Database service started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.pool.close().await;
        info!(service = "database", "Database service stopped");
        Ok(())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        if self.pool.ping().await {
            Ok(ServiceHealth::healthy())
        } else {
            warn!(service = "database", "Health check failed");
            Ok(ServiceHealth::unhealthy("database did not answer SELECT 1"))
        }
    }
}
