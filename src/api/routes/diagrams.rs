//! Diagram routes: CRUD, duplication and the technical-detail views.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use super::extract::JsonBody;
use super::response::ApiResponse;
use crate::aggregator::TechnicalStats;
use crate::models::{
    CreateDiagramRequest, Diagram, DiagramFilter, Pagination, TechnicalDetailsView,
    UpdateDiagramRequest,
};

/// Create the diagrams router
pub fn diagrams_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_diagrams).post(create_diagram))
        .route(
            "/{id}",
            get(get_diagram)
                .put(update_diagram)
                .patch(update_diagram)
                .delete(delete_diagram),
        )
        .route("/{id}/duplicate", post(duplicate_diagram))
        .route("/{id}/nodes", get(get_nodes))
        .route("/{id}/connections", get(get_connections))
        .route("/{id}/technical-details", get(get_technical_details))
        .route("/{id}/stats", get(get_stats))
}

/// Query parameters for listing diagrams. Empty values are ignored.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListDiagramsQuery {
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    /// Comma-separated tags; diagrams must carry all of them
    pub tags: Option<String>,
    /// Only the caller's diagrams (`1`, `true`, `on`, `yes`)
    pub my_diagrams: Option<String>,
    /// Variable, parameter or argument name fragment
    pub technical: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

fn filled(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "on" | "yes")
    )
}

impl ListDiagramsQuery {
    pub fn into_filter(self, caller: Uuid) -> (DiagramFilter, Pagination) {
        let pagination = Pagination::new(
            self.page.as_deref().and_then(|p| p.trim().parse().ok()),
            self.per_page.as_deref().and_then(|p| p.trim().parse().ok()),
        );
        let tags = self
            .tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let filter = DiagramFilter {
            active_only: true,
            owner: truthy(self.my_diagrams.as_deref()).then_some(caller),
            search: filled(self.search),
            tags,
            technical: filled(self.technical),
        };
        (filter, pagination)
    }
}

/// Unparsable ids cannot name a stored diagram.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Diagram not found"))
}

/// GET /diagrams - List active diagrams, newest first
#[utoipa::path(
    get,
    path = "/api/diagrams",
    tag = "Diagrams",
    params(ListDiagramsQuery),
    responses(
        (status = 200, description = "Diagrams retrieved successfully"),
        (status = 401, description = "Unauthenticated"),
        (status = 500, description = "Failed to retrieve diagrams")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_diagrams(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListDiagramsQuery>,
) -> Result<ApiResponse, ApiError> {
    let (filter, pagination) = query.into_filter(auth.user_id());
    let page = state
        .diagram_service
        .list(&filter, pagination)
        .await
        .map_err(ApiError::service("Failed to retrieve diagrams"))?;

    info!(
        "Listed {} of {} diagrams (page {})",
        page.data.len(),
        page.total,
        page.current_page
    );
    Ok(ApiResponse::ok("Diagrams retrieved successfully").data(page))
}

/// POST /diagrams - Create a diagram owned by the caller
#[utoipa::path(
    post,
    path = "/api/diagrams",
    tag = "Diagrams",
    request_body = CreateDiagramRequest,
    responses(
        (status = 201, description = "Diagram created successfully", body = Diagram),
        (status = 401, description = "Unauthenticated"),
        (status = 422, description = "Validation failed"),
        (status = 500, description = "Failed to create diagram")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_diagram(
    State(state): State<AppState>,
    auth: AuthContext,
    JsonBody(body): JsonBody,
) -> Result<ApiResponse, ApiError> {
    let diagram = state
        .diagram_service
        .create(auth.user_id(), &body)
        .await
        .map_err(ApiError::service("Failed to create diagram"))?;

    Ok(ApiResponse::created("Diagram created successfully").data(diagram))
}

/// GET /diagrams/{id} - Get a diagram (active or not)
#[utoipa::path(
    get,
    path = "/api/diagrams/{id}",
    tag = "Diagrams",
    params(("id" = String, Path, description = "Diagram UUID")),
    responses(
        (status = 200, description = "Diagram retrieved successfully", body = Diagram),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Diagram not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_diagram(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    let diagram = state
        .diagram_service
        .get(parse_id(&id)?)
        .await
        .map_err(ApiError::service("Failed to retrieve diagram"))?;

    Ok(ApiResponse::ok("Diagram retrieved successfully").data(diagram))
}

/// PUT/PATCH /diagrams/{id} - Partial update; replacing `data` bumps the version
#[utoipa::path(
    put,
    path = "/api/diagrams/{id}",
    tag = "Diagrams",
    params(("id" = String, Path, description = "Diagram UUID")),
    request_body = UpdateDiagramRequest,
    responses(
        (status = 200, description = "Diagram updated successfully", body = Diagram),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Unauthorized to update this diagram"),
        (status = 404, description = "Diagram not found"),
        (status = 409, description = "Version conflict"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_diagram(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<ApiResponse, ApiError> {
    let diagram = state
        .diagram_service
        .update(auth.user_id(), parse_id(&id)?, &body)
        .await
        .map_err(ApiError::service("Failed to update diagram"))?;

    Ok(ApiResponse::ok("Diagram updated successfully").data(diagram))
}

/// DELETE /diagrams/{id} - Soft delete
#[utoipa::path(
    delete,
    path = "/api/diagrams/{id}",
    tag = "Diagrams",
    params(("id" = String, Path, description = "Diagram UUID")),
    responses(
        (status = 200, description = "Diagram deleted successfully"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Unauthorized to delete this diagram"),
        (status = 404, description = "Diagram not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_diagram(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    state
        .diagram_service
        .delete(auth.user_id(), parse_id(&id)?)
        .await
        .map_err(ApiError::service("Failed to delete diagram"))?;

    Ok(ApiResponse::ok("Diagram deleted successfully"))
}

/// POST /diagrams/{id}/duplicate - Copy into a new diagram owned by the caller
#[utoipa::path(
    post,
    path = "/api/diagrams/{id}/duplicate",
    tag = "Diagrams",
    params(("id" = String, Path, description = "Diagram UUID")),
    responses(
        (status = 201, description = "Diagram duplicated successfully", body = Diagram),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Diagram not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn duplicate_diagram(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    let copy = state
        .diagram_service
        .duplicate(auth.user_id(), parse_id(&id)?)
        .await
        .map_err(ApiError::service("Failed to duplicate diagram"))?;

    Ok(ApiResponse::created("Diagram duplicated successfully").data(copy))
}

/// GET /diagrams/{id}/nodes
#[utoipa::path(
    get,
    path = "/api/diagrams/{id}/nodes",
    tag = "Technical Details",
    params(("id" = String, Path, description = "Diagram UUID")),
    responses(
        (status = 200, description = "Nodes retrieved successfully"),
        (status = 404, description = "Diagram not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_nodes(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    let nodes = state
        .diagram_service
        .nodes(parse_id(&id)?)
        .await
        .map_err(ApiError::service("Failed to retrieve nodes"))?;

    Ok(ApiResponse::ok("Nodes retrieved successfully").data(nodes))
}

/// GET /diagrams/{id}/connections
#[utoipa::path(
    get,
    path = "/api/diagrams/{id}/connections",
    tag = "Technical Details",
    params(("id" = String, Path, description = "Diagram UUID")),
    responses(
        (status = 200, description = "Connections retrieved successfully"),
        (status = 404, description = "Diagram not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_connections(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    let connections = state
        .diagram_service
        .connections(parse_id(&id)?)
        .await
        .map_err(ApiError::service("Failed to retrieve connections"))?;

    Ok(ApiResponse::ok("Connections retrieved successfully").data(connections))
}

/// GET /diagrams/{id}/technical-details - Nodes carrying technical items
#[utoipa::path(
    get,
    path = "/api/diagrams/{id}/technical-details",
    tag = "Technical Details",
    params(("id" = String, Path, description = "Diagram UUID")),
    responses(
        (status = 200, description = "Technical details retrieved successfully", body = TechnicalDetailsView),
        (status = 404, description = "Diagram not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_technical_details(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    let view = state
        .diagram_service
        .technical_details(parse_id(&id)?)
        .await
        .map_err(ApiError::service("Failed to retrieve technical details"))?;

    Ok(ApiResponse::ok("Technical details retrieved successfully").data(view))
}

/// GET /diagrams/{id}/stats - Technical statistics
#[utoipa::path(
    get,
    path = "/api/diagrams/{id}/stats",
    tag = "Technical Details",
    params(("id" = String, Path, description = "Diagram UUID")),
    responses(
        (status = 200, description = "Technical statistics retrieved successfully", body = TechnicalStats),
        (status = 404, description = "Diagram not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stats(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    let stats = state
        .diagram_service
        .technical_stats(parse_id(&id)?)
        .await
        .map_err(ApiError::service("Failed to retrieve technical statistics"))?;

    Ok(ApiResponse::ok("Technical statistics retrieved successfully").data(stats))
}
