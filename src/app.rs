//! Application state and HTTP router construction.
//!
//! Used by [HttpServerService](crate::services::http_server::HttpServerService)
//! and by the integration tests to build the Axum app.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::Config;
use crate::db::Database;
use crate::graphql::BookshelfSchema;
use crate::services::auth::AuthService;
use crate::services::{GraphqlService, ServicesManager};

/// Shared state for HTTP handlers (GraphQL, health routes).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub auth: AuthService,
    pub schema: BookshelfSchema,
    pub services: Arc<ServicesManager>,
}

/// Build the full Axum router: health probes, the GraphQL endpoint, and layers.
/// Returns Router<()> (state fully applied) for use with axum::serve.
pub fn build_app(state: AppState) -> Router<()> {
    Router::new()
        .merge(api::health::router())
        .merge(GraphqlService::router(&state.config.graphql_path))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
