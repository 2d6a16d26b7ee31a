//! Application configuration management

use std::env;

use anyhow::{Context, Result};
use base64::Engine;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Path the GraphQL endpoint is mounted on
    pub graphql_path: String,

    /// SQLite connection URL (`sqlite:./data/bookshelf.db`, `sqlite::memory:`)
    pub database_url: String,

    /// Connection pool size
    pub database_max_connections: u32,

    /// JWT signing secret
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub token_lifetime: i64,

    /// Bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            graphql_path: "/graphql".to_string(),
            database_url: "sqlite:./data/bookshelf.db".to_string(),
            database_max_connections: 10,
            jwt_secret: generate_dev_secret(),
            token_lifetime: 2 * 60 * 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret.trim().to_string(),
            _ => {
                tracing::warn!("JWT_SECRET not set; using a random secret for this process");
                defaults.jwt_secret
            }
        };

        let mut graphql_path = env::var("GRAPHQL_PATH").unwrap_or(defaults.graphql_path);
        if !graphql_path.starts_with('/') {
            graphql_path.insert(0, '/');
        }

        let config = Self {
            host: env::var("HOST").unwrap_or(defaults.host),

            port: parse_var("PORT", defaults.port)?,

            graphql_path,

            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),

            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,

            jwt_secret,

            token_lifetime: parse_var("TOKEN_LIFETIME", defaults.token_lifetime)?,

            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot work at runtime
    pub fn validate(&self) -> Result<()> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            anyhow::bail!("Invalid BCRYPT_COST: {} (must be between 4 and 31)", self.bcrypt_cost);
        }
        if self.token_lifetime <= 0 {
            anyhow::bail!("Invalid TOKEN_LIFETIME: {} (must be positive)", self.token_lifetime);
        }
        if self.database_max_connections == 0 {
            anyhow::bail!("Invalid DATABASE_MAX_CONNECTIONS: must be at least 1");
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn generate_dev_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    format!(
        "dev-secret-{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
