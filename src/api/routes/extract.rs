//! Request body extractor that defers field checks to the validators.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{Map, Value};

use super::error::ApiError;
use crate::api::validation::ValidationErrors;

/// Raw JSON body. An empty body reads as `{}`; unparsable JSON is a 422.
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::validation(&ValidationErrors::single(
                    "body",
                    format!("request body error: {rejection}"),
                ))
            })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(Value::Object(Map::new())));
        }

        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            ApiError::validation(&ValidationErrors::single(
                "body",
                format!("malformed JSON: {e}"),
            ))
        })
    }
}
