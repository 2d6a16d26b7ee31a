//! Schema synchronization run when the database service starts
//!
//! Tables are created when missing. Existing tables are left untouched;
//! columns are never renamed or retyped.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// A table and the statements that create it and its indexes
pub struct TableDef {
    pub name: &'static str,
    pub create_sql: &'static str,
    pub index_sql: &'static [&'static str],
}

pub const TABLES: &[TableDef] = &[TableDef {
    name: "users",
    create_sql: r#"
        CREATE TABLE users (
            id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            saved_books TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
    "#,
    index_sql: &["CREATE INDEX IF NOT EXISTS idx_users_created_at ON users (created_at)"],
}];

/// Result of a schema sync operation
#[derive(Debug, Default)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
    pub errors: Vec<String>,
}

/// Check if a table exists in the database
async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

/// Create every missing table in [TABLES] and ensure its indexes
pub async fn sync_all_schemas(pool: &SqlitePool) -> Result<SchemaSyncResult, sqlx::Error> {
    let mut result = SchemaSyncResult::default();

    for table in TABLES {
        if !table_exists(pool, table.name).await? {
            debug!("Creating table {}", table.name);
            match sqlx::query(table.create_sql).execute(pool).await {
                Ok(_) => {
                    info!("Created table: {}", table.name);
                    result.tables_created.push(table.name.to_string());
                }
                Err(e) => {
                    let msg = format!("Failed to create table {}: {}", table.name, e);
                    warn!("{}", msg);
                    result.errors.push(msg);
                    continue;
                }
            }
        }

        for index in table.index_sql {
            if let Err(e) = sqlx::query(index).execute(pool).await {
                let msg = format!("Failed to create index on {}: {}", table.name, e);
                warn!("{}", msg);
                result.errors.push(msg);
            }
        }
    }

    Ok(result)
}
