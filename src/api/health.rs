//! Health check endpoints

use std::collections::BTreeMap;

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::AppState;
use crate::services::manager::ServiceHealth;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub database: bool,
    pub services: BTreeMap<String, ServiceHealth>,
}

/// Health check - always returns OK if the server is running
async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check - database reachable and every registered service healthy
async fn readyz(State(state): State<AppState>) -> Json<ReadyResponse> {
    let database = state.db.ping().await;
    let services = state.services.health_all().await;
    let ready = database && services.values().all(ServiceHealth::is_healthy);

    Json(ReadyResponse {
        ready,
        database,
        services,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
