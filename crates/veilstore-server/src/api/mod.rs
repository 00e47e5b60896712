//! API module for the integrity layer server

pub mod error;
pub mod handlers;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use handlers::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub signing_key_loaded: bool,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Readiness check endpoint
///
/// GET /ready
pub async fn ready(State(state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: true,
        signing_key_loaded: !state.public_key_pem.is_empty(),
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration for browser-based clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Document ingestion
        .route("/v1/documents", post(handlers::ingest_document))
        // Audit endpoints
        .route("/v1/audit/append", post(handlers::append_audit_entry))
        .route("/v1/audit/logs", get(handlers::list_audit_logs))
        .route("/v1/audit/verify", get(handlers::verify_audit_chain))
        // Search index endpoints
        .route("/v1/index/links", post(handlers::append_index_links))
        .route("/v1/search", post(handlers::search_postings))
        // Key export
        .route("/v1/keys/public", get(handlers::export_public_key))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
