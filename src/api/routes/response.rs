//! Success envelope: `{"status": true, "message": ..., "data"?: ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use super::error::ApiError;

pub struct ApiResponse {
    status: StatusCode,
    message: String,
    data: Result<Option<Value>, serde_json::Error>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: Ok(None),
        }
    }

    pub fn created(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(message)
        }
    }

    /// Attach a payload; empty objects and arrays are omitted from the body.
    /// A payload that fails to serialize turns the response into a 500.
    pub fn data<T: Serialize>(mut self, data: T) -> Self {
        self.data = serde_json::to_value(data).map(|value| Some(value).filter(|v| !is_empty(v)));
        self
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let data = match self.data {
            Ok(data) => data,
            Err(e) => return ApiError::internal("Failed to serialize response", e).into_response(),
        };
        let body = match data {
            Some(data) => json!({
                "status": true,
                "message": self.message,
                "data": data,
            }),
            None => json!({
                "status": true,
                "message": self.message,
            }),
        };
        (self.status, Json(body)).into_response()
    }
}
