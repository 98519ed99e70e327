//! Authentication routes: email/password accounts with JWT bearer tokens.
//!
//! Security features:
//! - Argon2id password hashes
//! - Access and refresh tokens bound to a server-side session
//! - Login revokes every earlier session of the user
//! - Rate limiting on the credential endpoints

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, header},
    middleware,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use super::extract::JsonBody;
use super::response::ApiResponse;
use crate::api::validation::ValidationErrors;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::models::{AuthPayload, LoginRequest, NewUser, RegisterRequest, User, UserSummary};
use crate::services::jwt_service::{Claims, JwtService};
use crate::services::password_service;
use crate::storage::StorageError;

/// Active sessions, keyed by the session id carried in every token.
pub type SessionStore = Arc<Mutex<HashMap<String, SessionMetadata>>>;

/// Session metadata stored server-side (for revocation and tracking)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub user_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

pub fn new_session_store() -> SessionStore {
    Arc::new(Mutex::new(HashMap::new()))
}

const EMAIL_TAKEN: &str = "The email has already been taken.";

/// Create the auth router
pub fn auth_router(app_state: &AppState) -> Router<AppState> {
    let credential_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            app_state.auth_rate_limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .merge(credential_routes)
        .route("/user", get(current_user))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
}

/// Create a session for `user` and sign a token pair for it.
async fn issue_session(state: &AppState, user: &User) -> Result<AuthPayload, ApiError> {
    let session_id = Uuid::new_v4().to_string();
    let tokens = state
        .jwt_service
        .generate_token_pair(user.id, &user.email, &session_id)
        .map_err(|e| ApiError::internal("Failed to issue token", e))?;

    let now = Utc::now();
    state.session_store.lock().await.insert(
        session_id.clone(),
        SessionMetadata {
            user_id: user.id,
            email: user.email.clone(),
            created_at: now,
            last_activity: now,
        },
    );
    info!("Created session {} for user {}", session_id, user.id);

    Ok(AuthPayload {
        user: user.summary(),
        token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: tokens.token_type,
        expires_at: tokens.access_token_expires_at,
    })
}

/// Drop every session belonging to `user_id`; returns how many were removed.
async fn revoke_user_sessions(state: &AppState, user_id: Uuid) -> usize {
    let mut sessions = state.session_store.lock().await;
    let before = sessions.len();
    sessions.retain(|_, session| session.user_id != user_id);
    before - sessions.len()
}

/// POST /register - Create an account and sign in
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthPayload),
        (status = 422, description = "Validation failed"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Registration failed")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> Result<ApiResponse, ApiError> {
    let request = RegisterRequest::from_json(&body)?;

    let existing = state
        .storage
        .find_user_by_email(&request.email)
        .await
        .map_err(ApiError::storage("Registration failed"))?;
    if existing.is_some() {
        return Err(ValidationErrors::single("email", EMAIL_TAKEN).into());
    }

    let password = request.password;
    let password_hash =
        tokio::task::spawn_blocking(move || password_service::hash_password(&password))
            .await
            .map_err(|e| ApiError::internal("Registration failed", e))?
            .map_err(|e| ApiError::internal("Registration failed", e))?;

    let user = match state
        .storage
        .create_user(NewUser {
            name: request.name,
            email: request.email,
            password_hash,
        })
        .await
    {
        Ok(user) => user,
        Err(StorageError::Conflict(_)) => {
            return Err(ValidationErrors::single("email", EMAIL_TAKEN).into());
        }
        Err(e) => return Err(ApiError::storage("Registration failed")(e)),
    };

    info!("Registered user {} ({})", user.id, user.email);
    let payload = issue_session(&state, &user).await?;
    Ok(ApiResponse::created("User registered successfully").data(payload))
}

/// POST /login - Exchange credentials for a token pair
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthPayload),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Validation failed"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> Result<ApiResponse, ApiError> {
    let request = LoginRequest::from_json(&body)?;

    let user = state
        .storage
        .find_user_by_email(&request.email)
        .await
        .map_err(ApiError::storage("Login failed"))?;

    let Some(user) = user else {
        warn!("Login attempt for unknown email");
        return Err(invalid_credentials());
    };

    let password = request.password;
    let stored_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || {
        password_service::verify_password(&password, &stored_hash)
    })
    .await
    .map_err(|e| ApiError::internal("Login failed", e))?;

    if !verified {
        warn!("Failed login for user {}", user.id);
        return Err(invalid_credentials());
    }

    let revoked = revoke_user_sessions(&state, user.id).await;
    if revoked > 0 {
        info!("Revoked {} previous session(s) for user {}", revoked, user.id);
    }

    let payload = issue_session(&state, &user).await?;
    Ok(ApiResponse::ok("Login successful").data(payload))
}

fn invalid_credentials() -> ApiError {
    ApiError::new(axum::http::StatusCode::UNAUTHORIZED, "Invalid credentials")
}

/// GET /user - Current user
#[utoipa::path(
    get,
    path = "/api/user",
    tag = "Auth",
    responses(
        (status = 200, description = "User retrieved successfully", body = UserSummary),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn current_user(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<ApiResponse, ApiError> {
    let user = state
        .storage
        .get_user(auth.user_id())
        .await
        .map_err(ApiError::storage("Failed to retrieve user"))?
        .ok_or_else(ApiError::unauthenticated)?;

    Ok(ApiResponse::ok("User retrieved successfully").data(json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "created_at": user.created_at,
    })))
}

/// POST /logout - Revoke the current session
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out successfully"),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<ApiResponse, ApiError> {
    state.session_store.lock().await.remove(&auth.session_id);
    info!("Logged out and revoked session: {}", auth.session_id);
    Ok(ApiResponse::ok("Logged out successfully"))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RefreshTokenRequest {
    /// Refresh token; when omitted the bearer access token is used instead
    pub refresh_token: Option<String>,
}

/// Claims of the token presented for refresh: the body's refresh token, or the bearer access token.
fn refresh_claims(
    jwt_service: &JwtService,
    headers: &HeaderMap,
    body: &serde_json::Value,
) -> Result<Claims, ApiError> {
    if let Some(refresh_token) = body.get("refresh_token").and_then(|v| v.as_str()) {
        return jwt_service.validate_refresh_token(refresh_token).map_err(|e| {
            warn!("Refresh token rejected: {}", e);
            ApiError::unauthenticated()
        });
    }

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(JwtService::extract_bearer_token)
        .ok_or_else(ApiError::unauthenticated)?;
    jwt_service.validate_access_token(token).map_err(|e| {
        warn!("Access token rejected on refresh: {}", e);
        ApiError::unauthenticated()
    })
}

/// POST /refresh - Rotate the session and issue a new token pair
#[utoipa::path(
    post,
    path = "/api/refresh",
    tag = "Auth",
    request_body(content = RefreshTokenRequest, description = "Optional refresh token"),
    responses(
        (status = 200, description = "Token refreshed successfully", body = AuthPayload),
        (status = 401, description = "Unauthenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody,
) -> Result<ApiResponse, ApiError> {
    let claims = refresh_claims(&state.jwt_service, &headers, &body)?;
    let user_id = claims.user_id().map_err(|_| ApiError::unauthenticated())?;

    let removed = state.session_store.lock().await.remove(&claims.session_id);
    match removed {
        Some(session) if session.user_id == user_id => {}
        _ => {
            warn!("Refresh for unknown session {}", claims.session_id);
            return Err(ApiError::unauthenticated());
        }
    }

    let user = state
        .storage
        .get_user(user_id)
        .await
        .map_err(ApiError::storage("Token refresh failed"))?
        .ok_or_else(ApiError::unauthenticated)?;

    let payload = issue_session(&state, &user).await?;
    info!("Rotated session {} for user {}", claims.session_id, user.id);
    Ok(ApiResponse::ok("Token refreshed successfully").data(payload))
}
