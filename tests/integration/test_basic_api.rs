//! Basic API integration tests

use axum::http::StatusCode;
use diagram_api::routes;
use serde_json::Value;

fn server() -> axum_test::TestServer {
    let app = routes::create_app(routes::create_app_state());
    axum_test::TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = server().get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_api_health_check() {
    let response = server().get("/api/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let response = server().get("/api/openapi.json").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let doc = response.json::<Value>();
    assert!(doc["paths"]["/api/diagrams/{id}/technical-details"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let response = server().get("/api/diagrams").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body = response.json::<Value>();
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Unauthenticated.");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let response = server()
        .get("/api/user")
        .authorization_bearer("not-a-jwt")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}
