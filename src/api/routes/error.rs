//! API error handling utilities.
//!
//! Every failure is rendered as `{"status": false, "message": ..., "data"?: ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::error;

use crate::api::validation::ValidationErrors;
use crate::services::ServiceError;
use crate::storage::StorageError;

/// API error response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub data: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthenticated.")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn validation(errors: &ValidationErrors) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation failed")
            .with_data(serde_json::to_value(errors).unwrap_or(Value::Null))
    }

    pub fn too_many_requests() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests. Please try again later.",
        )
    }

    /// 500 whose message is `"{context}: {detail}"`; the detail is logged too.
    pub fn internal(context: &str, detail: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, detail);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}: {}", context, detail),
        )
    }

    /// Map a service failure, using `context` as the prefix for unexpected errors.
    pub fn service(context: &'static str) -> impl Fn(ServiceError) -> ApiError {
        move |err| match err {
            ServiceError::Validation(errors) => ApiError::validation(&errors),
            ServiceError::Forbidden(message) => ApiError::new(StatusCode::FORBIDDEN, message),
            ServiceError::NotFound => ApiError::not_found("Diagram not found"),
            ServiceError::Storage(storage) => ApiError::storage(context)(storage),
        }
    }

    pub fn storage(context: &'static str) -> impl Fn(StorageError) -> ApiError {
        move |err| match err {
            StorageError::NotFound { entity_type, .. } => {
                ApiError::not_found(format!("{} not found", capitalize(&entity_type)))
            }
            StorageError::VersionConflict {
                expected_version,
                current_version,
                current_data,
                ..
            } => ApiError::new(
                StatusCode::CONFLICT,
                format!(
                    "Version conflict: expected version {}, current version is {}",
                    expected_version, current_version
                ),
            )
            .with_data(json!({
                "expected_version": expected_version,
                "current_version": current_version,
                "current": current_data,
            })),
            StorageError::Conflict(message) => ApiError::new(StatusCode::CONFLICT, message),
            other => ApiError::internal(context, other),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation(&errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.data {
            Some(data) => json!({
                "status": false,
                "message": self.message,
                "data": data,
            }),
            None => json!({
                "status": false,
                "message": self.message,
            }),
        };

        (self.status, axum::Json(body)).into_response()
    }
}
