//! GraphQL service: owns schema building and exposes the HTTP routes for the endpoint.
//!
//! Depends on the database service; the schema is built in [start](Service::start) and
//! dropped in [stop](Service::stop). The HTTP server reads it through [GraphqlService::schema].

use anyhow::Result;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::RwLock;
use tracing::info;

use crate::app::AppState;
use crate::db::Database;
use crate::graphql::{BookshelfSchema, authenticate, build_schema};
use crate::services::auth::AuthService;
use crate::services::manager::{Service, ServiceHealth};

/// GraphQL service: builds and holds the schema.
pub struct GraphqlService {
    db: Database,
    auth: AuthService,
    schema: RwLock<Option<BookshelfSchema>>,
}

impl GraphqlService {
    pub fn new(db: Database, auth: AuthService) -> Self {
        Self {
            db,
            auth,
            schema: RwLock::new(None),
        }
    }

    /// The built schema, if the service has been started.
    pub async fn schema(&self) -> Option<BookshelfSchema> {
        self.schema.read().await.clone()
    }

    /// Router serving `path`: POST executes, GET serves the GraphiQL playground.
    pub fn router(path: &str) -> Router<AppState> {
        Router::new().route(path, get(graphiql).post(graphql_handler))
    }
}

async fn graphiql(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let accepts_html = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if accepts_html {
        axum::response::Html(
            GraphiQLSource::build()
                .endpoint(&state.config.graphql_path)
                .finish(),
        )
        .into_response()
    } else {
        (
            axum::http::StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "GET requests are not supported for GraphQL queries. Use POST with Content-Type: application/json"
            })),
        )
            .into_response()
    }
}

async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();
    if let Some(user) = authenticate(&headers, &state.auth) {
        request = request.data(user);
    }
    state.schema.execute(request).await.into()
}

#[async_trait]
impl Service for GraphqlService {
    fn name(&self) -> &str {
        "graphql"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["database".to_string()]
    }

    async fn start(&self) -> Result<()> {
        info!(service = "graphql", "GraphQL service starting");
        let schema = build_schema(self.db.clone(), self.auth.clone());
        *self.schema.write().await = Some(schema);
        info!(service = "graphql", "GraphQL service started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        *self.schema.write().await = None;
        info!(service = "graphql", "GraphQL service stopped");
        Ok(())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        if self.schema.read().await.is_some() {
            Ok(ServiceHealth::healthy())
        } else {
            Ok(ServiceHealth::unhealthy("schema not built"))
        }
    }
}
