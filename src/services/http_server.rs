//! HTTP server service: binds the Axum app and runs it in a background task.
//!
//! Depends on the GraphQL service; [start](Service::start) builds [AppState] from the
//! started schema and serves until [stop](Service::stop) triggers a graceful shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::oneshot;
use tracing::info;

use crate::app::{AppState, build_app};
use crate::config::Config;
use crate::db::Database;
use crate::services::ServicesManager;
use crate::services::auth::AuthService;
use crate::services::graphql::GraphqlService;
use crate::services::manager::{Service, ServiceHealth};

/// HTTP server service: binds and serves the Axum app in a background task.
pub struct HttpServerService {
    manager: Arc<ServicesManager>,
    config: Arc<Config>,
    db: Database,
    auth: AuthService,
    graphql: Arc<GraphqlService>,
    /// JoinHandle for the server task; set in start(), taken in stop().
    join_handle: RwLock<Option<tokio::task::JoinHandle<Result<()>>>>,
    /// Fires the graceful shutdown; set in start(), taken in stop().
    shutdown_tx: RwLock<Option<oneshot::Sender<()>>>,
}

impl HttpServerService {
    pub fn new(
        manager: Arc<ServicesManager>,
        config: Arc<Config>,
        db: Database,
        auth: AuthService,
        graphql: Arc<GraphqlService>,
    ) -> Self {
        Self {
            manager,
            config,
            db,
            auth,
            graphql,
            join_handle: RwLock::new(None),
            shutdown_tx: RwLock::new(None),
        }
    }
}

#[async_trait]
impl Service for HttpServerService {
    fn name(&self) -> &str {
        "http"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["graphql".to_string()]
    }

    async fn start(&self) -> Result<()> {
        info!(service = "http", "HTTP server service starting");

        let schema = self
            .graphql
            .schema()
            .await
            .ok_or_else(|| anyhow::anyhow!("graphql schema not built"))?;

        let state = AppState {
            config: self.config.clone(),
            db: self.db.clone(),
            auth: self.auth.clone(),
            schema,
            services: self.manager.clone(),
        };

        let app = build_app(state);
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("HTTP server: bind {} failed", addr))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .context("axum::serve")
        });

        *self.join_handle.write() = Some(join);
        *self.shutdown_tx.write() = Some(shutdown_tx);

        info!(
            service = "http",
            "Server running at http://{}{}",
            local_addr,
            self.config.graphql_path
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let tx = self.shutdown_tx.write().take();
        let handle = self.join_handle.write().take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
        if let Some(h) = handle {
            h.await.context("HTTP server task panicked")??;
        }
        info!(service = "http", "HTTP server service stopped");
        Ok(())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        match self.join_handle.read().as_ref() {
            Some(h) if !h.is_finished() => Ok(ServiceHealth::healthy()),
            _ => Ok(ServiceHealth::unhealthy("server task not running")),
        }
    }
}
