//! Authentication flow integration tests

use axum::http::StatusCode;
use axum_test::TestServer;
use diagram_api::api::config::ApiConfig;
use diagram_api::routes::{self, AppState};
use serde_json::{Value, json};

fn server() -> TestServer {
    TestServer::new(routes::create_app(routes::create_app_state())).unwrap()
}

async fn register(server: &TestServer, email: &str) -> Value {
    let response = server
        .post("/api/register")
        .json(&json!({
            "name": "Ada Lovelace",
            "email": email,
            "password": "password123",
            "password_confirmation": "password123"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

async fn login(server: &TestServer, email: &str, password: &str) -> axum_test::TestResponse {
    server
        .post("/api/login")
        .json(&json!({"email": email, "password": password}))
        .await
}

fn token(body: &Value) -> String {
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_returns_user_and_tokens() {
    let server = server();
    let body = register(&server, "ada@example.com").await;

    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["data"]["user"]["email"], "ada@example.com");
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert!(body["data"]["refresh_token"].is_string());
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let server = server();
    register(&server, "ada@example.com").await;

    let response = server
        .post("/api/register")
        .json(&json!({
            "name": "Other",
            "email": "ADA@example.com",
            "password": "password123",
            "password_confirmation": "password123"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["data"]["email"][0], "The email has already been taken.");
}

#[tokio::test]
async fn test_register_validation() {
    let response = server()
        .post("/api/register")
        .json(&json!({"email": "bad"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    assert_eq!(body["status"], false);
    assert!(body["data"]["name"].is_array());
    assert!(body["data"]["password"].is_array());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let server = server();
    register(&server, "ada@example.com").await;

    let response = login(&server, "ada@example.com", "wrong-password").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Invalid credentials");

    let response = login(&server, "nobody@example.com", "password123").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_current_user() {
    let server = server();
    let body = register(&server, "ada@example.com").await;

    let response = server
        .get("/api/user")
        .authorization_bearer(token(&body))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["message"], "User retrieved successfully");
    assert_eq!(body["data"]["name"], "Ada Lovelace");
    assert!(body["data"]["created_at"].is_string());
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let server = server();
    let access = token(&register(&server, "ada@example.com").await);

    let response = server
        .post("/api/logout")
        .authorization_bearer(&access)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["message"], "Logged out successfully");

    let response = server.get("/api/user").authorization_bearer(&access).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_revokes_previous_sessions() {
    let server = server();
    let first = token(&register(&server, "ada@example.com").await);

    let response = login(&server, "ada@example.com", "password123").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let second = token(&response.json::<Value>());

    let stale = server.get("/api/user").authorization_bearer(&first).await;
    assert_eq!(stale.status_code(), StatusCode::UNAUTHORIZED);

    let fresh = server.get("/api/user").authorization_bearer(&second).await;
    assert_eq!(fresh.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rotates_session() {
    let server = server();
    let body = register(&server, "ada@example.com").await;
    let access = token(&body);
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let response = server
        .post("/api/refresh")
        .json(&json!({"refresh_token": refresh}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let rotated = response.json::<Value>();
    assert_eq!(rotated["message"], "Token refreshed successfully");
    let new_access = token(&rotated);

    let old = server.get("/api/user").authorization_bearer(&access).await;
    assert_eq!(old.status_code(), StatusCode::UNAUTHORIZED);
    let new = server.get("/api/user").authorization_bearer(&new_access).await;
    assert_eq!(new.status_code(), StatusCode::OK);

    // The consumed refresh token cannot be replayed
    let replay = server
        .post("/api/refresh")
        .json(&json!({"refresh_token": refresh}))
        .await;
    assert_eq!(replay.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_bearer_access_token() {
    let server = server();
    let access = token(&register(&server, "ada@example.com").await);

    let response = server
        .post("/api/refresh")
        .authorization_bearer(&access)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let server = server();
    let access = token(&register(&server, "ada@example.com").await);

    let response = server
        .post("/api/refresh")
        .json(&json!({"refresh_token": access}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_credential_endpoints_are_rate_limited() {
    let config = ApiConfig {
        auth_rate_limit_per_minute: 2,
        ..ApiConfig::default()
    };
    let server = TestServer::new(routes::create_app(AppState::in_memory(config))).unwrap();

    for _ in 0..2 {
        let response = login(&server, "nobody@example.com", "password123").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
    let response = login(&server, "nobody@example.com", "password123").await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json::<Value>()["status"], false);
}
