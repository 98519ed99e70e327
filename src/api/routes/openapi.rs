//! `/api/openapi.json`: the generated document, built once per process.

use axum::{Router, response::Json, routing::get};
use once_cell::sync::Lazy;
use utoipa::OpenApi;

use super::app_state::AppState;
use crate::api::openapi::ApiDoc;

static DOCUMENT: Lazy<utoipa::openapi::OpenApi> = Lazy::new(ApiDoc::openapi);

pub fn openapi_router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi_json))
}

/// GET /openapi.json - Serve the OpenAPI document
#[utoipa::path(
    get,
    path = "/api/openapi.json",
    tag = "OpenAPI",
    responses(
        (status = 200, description = "OpenAPI document", body = Object)
    )
)]
pub async fn serve_openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(DOCUMENT.clone())
}
