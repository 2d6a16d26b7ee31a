//! Bookshelf backend - GraphQL service for user accounts and saved books
//!
//! Wires configuration, the database pool, and the lifecycle-managed services,
//! then serves GraphQL until interrupted.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookshelf::config::Config;
use bookshelf::services::{
    AuthConfig, AuthService, DatabaseService, DatabaseServiceConfig, GraphqlService,
    HttpServerService, ServicesManager,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Tracing first so configuration warnings are visible
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshelf=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Starting Bookshelf backend");

    let config = Arc::new(Config::from_env()?);
    tracing::info!("Configuration loaded");

    let database = Arc::new(
        DatabaseService::from_config(DatabaseServiceConfig {
            database_url: config.database_url.clone(),
            max_connections: config.database_max_connections,
            connect_timeout: Duration::from_secs(30),
        })
        .await?,
    );
    let db = database.pool().clone();
    tracing::info!("Database connected");

    let auth = AuthService::new(AuthConfig::from(config.as_ref()));
    let graphql = Arc::new(GraphqlService::new(db.clone(), auth.clone()));

    let manager = Arc::new(ServicesManager::new());
    manager.register(database).await;
    manager.register(graphql.clone()).await;
    manager
        .register(Arc::new(HttpServerService::new(
            manager.clone(),
            config.clone(),
            db,
            auth,
            graphql,
        )))
        .await;

    manager.start_all().await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    manager.stop_all().await?;
    tracing::info!("Bookshelf backend stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
