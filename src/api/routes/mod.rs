//! API routes module - organizes all route handlers.
//!
//! Everything except the root health check lives under `/api`.

pub mod app_state;
pub mod auth;
pub mod auth_context;
pub mod diagrams;
pub mod error;
pub mod extract;
pub mod openapi;
pub mod response;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use app_state::AppState;

use crate::api::config::ApiConfig;
use crate::middleware::cors::create_cors_layer;
use crate::storage::StorageError;

/// Create the API router (mounted under `/api` by [`create_app`])
pub fn create_api_router(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth::auth_router(&app_state))
        .nest("/diagrams", diagrams::diagrams_router())
        // OpenAPI documentation endpoints
        .merge(openapi::openapi_router())
    // Note: State is applied by callers who need it (e.g., TestServer)
    // For production use, call .with_state(app_state) after creating the router
}

/// Full application: root health check, `/api` routes, tracing and CORS.
pub fn create_app(app_state: AppState) -> Router {
    let cors = create_cors_layer(app_state.config.cors_origins.as_deref());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", create_api_router(app_state.clone()))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Create in-memory application state with development defaults.
pub fn create_app_state() -> AppState {
    AppState::in_memory(ApiConfig::default())
}

/// Create the application state with storage initialization (async).
///
/// This is the preferred method for production use.
pub async fn create_app_state_with_storage(config: ApiConfig) -> Result<AppState, StorageError> {
    AppState::from_config(config).await
}

/// GET /health - Liveness plus a storage probe
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let backend = if state.is_postgres() { "postgres" } else { "memory" };
    match state.storage.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "diagram-api",
                "version": env!("CARGO_PKG_VERSION"),
                "storage": backend,
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "service": "diagram-api",
                    "version": env!("CARGO_PKG_VERSION"),
                    "storage": backend,
                })),
            )
        }
    }
}
