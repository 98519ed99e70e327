//! Application state management.
//!
//! Defines the AppState struct that holds all shared application state including
//! the storage backend, diagram service, session store and JWT service.

use crate::api::config::ApiConfig;
use crate::middleware::rate_limit::{RateLimiterState, create_rate_limiter_with_quota};
use crate::services::jwt_service::{JwtService, SharedJwtService};
use crate::services::DiagramService;
use crate::storage::{
    MemoryStorageBackend, PostgresStorageBackend, StorageBackend, StorageError,
};
use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Application state shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    /// Storage backend (PostgreSQL or in-memory)
    pub storage: Arc<dyn StorageBackend>,
    pub diagram_service: DiagramService,
    /// Session store for authentication
    pub session_store: crate::routes::auth::SessionStore,
    pub jwt_service: SharedJwtService,
    /// Shared limiter for the credential endpoints
    pub auth_rate_limiter: RateLimiterState,
    /// PostgreSQL database connection pool (optional)
    pub database: Option<PgPool>,
}

impl AppState {
    pub fn new(config: ApiConfig, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            jwt_service: Arc::new(JwtService::from_config(&config)),
            auth_rate_limiter: create_rate_limiter_with_quota(config.auth_rate_limit_per_minute),
            diagram_service: DiagramService::new(storage.clone()),
            session_store: crate::routes::auth::new_session_store(),
            storage,
            config: Arc::new(config),
            database: None,
        }
    }

    /// State backed by the in-memory store.
    pub fn in_memory(config: ApiConfig) -> Self {
        Self::new(config, Arc::new(MemoryStorageBackend::new()))
    }

    /// Connect to PostgreSQL and run migrations when `DATABASE_URL` is
    /// configured; otherwise fall back to in-memory storage.
    pub async fn from_config(config: ApiConfig) -> Result<Self, StorageError> {
        let Some(database_url) = config.database_url.clone() else {
            info!("DATABASE_URL not set, using in-memory storage");
            return Ok(Self::in_memory(config));
        };

        let pool = sqlx::PgPool::connect(&database_url)
            .await
            .map_err(|e| {
                StorageError::ConnectionError(format!("Failed to connect to database: {}", e))
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::ConnectionError(format!("Migration failed: {}", e)))?;
        info!("Connected to PostgreSQL and applied migrations");

        let storage: Arc<dyn StorageBackend> = Arc::new(PostgresStorageBackend::new(pool.clone()));
        let mut state = Self::new(config, storage);
        state.database = Some(pool);
        Ok(state)
    }

    /// Check if PostgreSQL storage is enabled
    pub fn is_postgres(&self) -> bool {
        self.database.is_some()
    }
}

impl FromRef<AppState> for crate::routes::auth::SessionStore {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.session_store.clone()
    }
}

impl FromRef<AppState> for RateLimiterState {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_rate_limiter.clone()
    }
}
