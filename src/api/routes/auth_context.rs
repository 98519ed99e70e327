//! Authentication context utilities.
//!
//! Provides the extractor that turns a bearer token into the calling user.

use super::app_state::AppState;
use super::error::ApiError;
use crate::services::jwt_service::JwtService;
use crate::storage::traits::UserContext;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::Utc;

/// Authentication context extracted from request
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_context: UserContext,
    pub session_id: String,
}

impl AuthContext {
    pub fn user_id(&self) -> uuid::Uuid {
        self.user_context.user_id
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(JwtService::extract_bearer_token)
            .ok_or_else(|| {
                tracing::debug!("No authorization token provided");
                ApiError::unauthenticated()
            })?;

        let claims = state.jwt_service.validate_access_token(token).map_err(|e| {
            tracing::warn!("JWT validation failed: {}", e);
            ApiError::unauthenticated()
        })?;

        let user_id = claims.user_id().map_err(|e| {
            tracing::warn!("JWT subject rejected: {}", e);
            ApiError::unauthenticated()
        })?;

        // Token must belong to a live session of the same user
        {
            let mut sessions = state.session_store.lock().await;
            match sessions.get_mut(&claims.session_id) {
                Some(session) if session.user_id == user_id => {
                    session.last_activity = Utc::now();
                }
                _ => {
                    tracing::warn!("Session {} not found in store", claims.session_id);
                    return Err(ApiError::unauthenticated());
                }
            }
        }

        Ok(AuthContext {
            user_context: UserContext { user_id },
            session_id: claims.session_id,
        })
    }
}
