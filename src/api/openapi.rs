//! OpenAPI specification definition.
//!
//! Aggregates all route handlers and schemas for OpenAPI documentation generation.

use utoipa::{Modify, OpenApi};
#[derive(OpenApi)]
#[openapi(
    paths(
        // Authentication
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::current_user,
        crate::routes::auth::logout,
        crate::routes::auth::refresh,
        // Diagrams
        crate::routes::diagrams::list_diagrams,
        crate::routes::diagrams::create_diagram,
        crate::routes::diagrams::get_diagram,
        crate::routes::diagrams::update_diagram,
        crate::routes::diagrams::delete_diagram,
        crate::routes::diagrams::duplicate_diagram,
        // Technical details
        crate::routes::diagrams::get_nodes,
        crate::routes::diagrams::get_connections,
        crate::routes::diagrams::get_technical_details,
        crate::routes::diagrams::get_stats,
        // OpenAPI
        crate::routes::openapi::serve_openapi_json,
    ),
    components(schemas(
        crate::models::Diagram,
        crate::models::UserSummary,
        crate::models::CreateDiagramRequest,
        crate::models::UpdateDiagramRequest,
        crate::models::TechnicalDetailsView,
        crate::models::RegisterRequest,
        crate::models::LoginRequest,
        crate::models::AuthPayload,
        crate::routes::auth::RefreshTokenRequest,
        crate::aggregator::TechnicalStats,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token management"),
        (name = "Diagrams", description = "Diagram CRUD operations"),
        (name = "Technical Details", description = "Aggregated node, connection and technical-detail views"),
        (name = "OpenAPI", description = "OpenAPI specification"),
    ),
    info(
        title = "Diagram API",
        description = "REST API for storing flow diagrams and aggregating their technical details",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8081", description = "Local development server")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // Update version to match Cargo.toml version
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();

        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        let bearer = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .build();

        openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::new)
            .add_security_scheme("bearer_auth", SecurityScheme::Http(bearer));
    }
}
