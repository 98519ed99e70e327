//! Diagram CRUD and technical-detail endpoint tests

use axum::http::StatusCode;
use axum_test::TestServer;
use diagram_api::routes;
use serde_json::{Value, json};

fn server() -> TestServer {
    TestServer::new(routes::create_app(routes::create_app_state())).unwrap()
}

async fn register(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/register")
        .json(&json!({
            "name": email,
            "email": email,
            "password": "password123",
            "password_confirmation": "password123"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn payroll_body() -> Value {
    json!({
        "title": "Payroll",
        "description": "Overtime calculation",
        "tags": ["hr", "finance"],
        "data": {
            "nodes": [
                {
                    "id": "calc",
                    "label": "Calculate",
                    "position": {"x": 100, "y": 40},
                    "details": {
                        "variables": [{"name": "total_ot"}],
                        "parameters": [{"name": "employee_id"}],
                        "payloads": [
                            {"direction": "incoming"},
                            {"direction": "outgoing"},
                            {"direction": "internal"}
                        ]
                    }
                },
                {"id": "end", "label": "End", "details": {}}
            ],
            "connections": [{"from": "calc", "to": "end"}],
            "viewport": {"zoom": 1}
        }
    })
}

async fn create(server: &TestServer, token: &str, body: Value) -> Value {
    let response = server
        .post("/api/diagrams")
        .authorization_bearer(token)
        .json(&body)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

fn id(diagram: &Value) -> String {
    diagram["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_and_show() {
    let server = server();
    let token = register(&server, "owner@example.com").await;

    let diagram = create(&server, &token, payroll_body()).await;
    assert_eq!(diagram["version"], 1);
    assert_eq!(diagram["is_active"], true);
    assert_eq!(diagram["creator"]["email"], "owner@example.com");
    assert_eq!(diagram["data"]["viewport"]["zoom"], 1);
    assert_eq!(diagram["data"]["nodes"][0]["position"]["x"], 100);

    let response = server
        .get(&format!("/api/diagrams/{}", id(&diagram)))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["message"], "Diagram retrieved successfully");
    assert_eq!(body["data"]["title"], "Payroll");
}

#[tokio::test]
async fn test_create_missing_title() {
    let server = server();
    let token = register(&server, "owner@example.com").await;

    let response = server
        .post("/api/diagrams")
        .authorization_bearer(&token)
        .json(&json!({"data": {"nodes": [], "connections": []}}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    assert_eq!(body["status"], false);
    assert_eq!(body["data"]["title"][0], "The title field is required.");
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = server();
    let token = register(&server, "owner@example.com").await;

    let response = server
        .post("/api/diagrams")
        .authorization_bearer(&token)
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let server = server();
    let token = register(&server, "owner@example.com").await;

    for path in [
        "/api/diagrams/00000000-0000-0000-0000-000000000000",
        "/api/diagrams/not-a-uuid",
        "/api/diagrams/00000000-0000-0000-0000-000000000000/stats",
    ] {
        let response = server.get(path).authorization_bearer(&token).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["message"], "Diagram not found");
    }
}

#[tokio::test]
async fn test_update_data_bumps_version() {
    let server = server();
    let token = register(&server, "owner@example.com").await;
    let diagram = create(&server, &token, payroll_body()).await;
    let path = format!("/api/diagrams/{}", id(&diagram));

    let response = server
        .put(&path)
        .authorization_bearer(&token)
        .json(&json!({"title": "Payroll v2"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"]["version"], 1);

    let response = server
        .patch(&path)
        .authorization_bearer(&token)
        .json(&json!({"data": {"nodes": [], "connections": []}}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["message"], "Diagram updated successfully");
    assert_eq!(body["data"]["version"], 2);
    assert_eq!(body["data"]["title"], "Payroll v2");
}

#[tokio::test]
async fn test_update_with_stale_version_conflicts() {
    let server = server();
    let token = register(&server, "owner@example.com").await;
    let diagram = create(&server, &token, payroll_body()).await;
    let path = format!("/api/diagrams/{}", id(&diagram));

    server
        .put(&path)
        .authorization_bearer(&token)
        .json(&json!({"data": {"nodes": []}, "expected_version": 1}))
        .await;

    let response = server
        .put(&path)
        .authorization_bearer(&token)
        .json(&json!({"title": "Late edit", "expected_version": 1}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body = response.json::<Value>();
    assert_eq!(body["data"]["current_version"], 2);
    assert_eq!(body["data"]["current"]["title"], "Payroll");
}

#[tokio::test]
async fn test_non_owner_cannot_modify() {
    let server = server();
    let owner = register(&server, "owner@example.com").await;
    let other = register(&server, "other@example.com").await;
    let diagram = create(&server, &owner, payroll_body()).await;
    let path = format!("/api/diagrams/{}", id(&diagram));

    let response = server
        .put(&path)
        .authorization_bearer(&other)
        .json(&json!({"title": "Mine now"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["message"],
        "Unauthorized to update this diagram"
    );

    let response = server.delete(&path).authorization_bearer(&other).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["message"],
        "Unauthorized to delete this diagram"
    );

    // Reads are open to every authenticated user
    let response = server.get(&path).authorization_bearer(&other).await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_is_soft() {
    let server = server();
    let token = register(&server, "owner@example.com").await;
    let diagram = create(&server, &token, payroll_body()).await;
    let path = format!("/api/diagrams/{}", id(&diagram));

    let response = server.delete(&path).authorization_bearer(&token).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["message"], "Diagram deleted successfully");
    assert!(body.get("data").is_none());

    let list = server
        .get("/api/diagrams")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(list["data"]["total"], 0);

    let shown = server.get(&path).authorization_bearer(&token).await;
    assert_eq!(shown.status_code(), StatusCode::OK);
    assert_eq!(shown.json::<Value>()["data"]["is_active"], false);
}

#[tokio::test]
async fn test_technical_views() {
    let server = server();
    let token = register(&server, "owner@example.com").await;
    let diagram = create(&server, &token, payroll_body()).await;
    let base = format!("/api/diagrams/{}", id(&diagram));

    let stats = server
        .get(&format!("{base}/stats"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(stats["message"], "Technical statistics retrieved successfully");
    assert_eq!(
        stats["data"],
        json!({
            "total_nodes": 2,
            "nodes_with_details": 1,
            "total_variables": 1,
            "total_parameters": 1,
            "total_arguments": 0,
            "total_payloads": 3,
            "incoming_payloads": 1,
            "outgoing_payloads": 1
        })
    );

    let details = server
        .get(&format!("{base}/technical-details"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(details["data"]["technical_items_count"], 5);
    assert_eq!(details["data"]["nodes"].as_array().unwrap().len(), 1);
    assert_eq!(details["data"]["nodes"][0]["id"], "calc");

    let nodes = server
        .get(&format!("{base}/nodes"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(nodes["message"], "Nodes retrieved successfully");
    assert_eq!(nodes["data"].as_array().unwrap().len(), 2);

    let connections = server
        .get(&format!("{base}/connections"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(connections["data"][0]["from"], "calc");
}

#[tokio::test]
async fn test_empty_diagram_omits_data() {
    let server = server();
    let token = register(&server, "owner@example.com").await;
    let diagram = create(
        &server,
        &token,
        json!({"title": "Empty", "data": {"nodes": null, "connections": null}}),
    )
    .await;

    let nodes = server
        .get(&format!("/api/diagrams/{}/nodes", id(&diagram)))
        .authorization_bearer(&token)
        .await;
    assert_eq!(nodes.status_code(), StatusCode::OK);
    assert!(nodes.json::<Value>().get("data").is_none());
}

#[tokio::test]
async fn test_duplicate() {
    let server = server();
    let owner = register(&server, "owner@example.com").await;
    let other = register(&server, "other@example.com").await;
    let diagram = create(&server, &owner, payroll_body()).await;

    let response = server
        .post(&format!("/api/diagrams/{}/duplicate", id(&diagram)))
        .authorization_bearer(&other)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let copy = response.json::<Value>()["data"].clone();
    assert_eq!(copy["title"], "Payroll (Copy)");
    assert_eq!(copy["version"], 1);
    assert_eq!(copy["creator"]["email"], "other@example.com");
    assert_ne!(copy["id"], diagram["id"]);
    assert_eq!(copy["data"], diagram["data"]);
}

#[tokio::test]
async fn test_list_filters() {
    let server = server();
    let owner = register(&server, "owner@example.com").await;
    let other = register(&server, "other@example.com").await;

    create(&server, &owner, payroll_body()).await;
    create(
        &server,
        &other,
        json!({
            "title": "Shipping",
            "tags": ["logistics"],
            "data": {"nodes": [{"details": {"arguments": [{"name": "carrier"}]}}]}
        }),
    )
    .await;

    let titles = |body: Value| -> Vec<String> {
        body["data"]["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["title"].as_str().unwrap().to_string())
            .collect()
    };

    let all = server
        .get("/api/diagrams")
        .authorization_bearer(&owner)
        .await
        .json::<Value>();
    assert_eq!(all["message"], "Diagrams retrieved successfully");
    assert_eq!(all["data"]["total"], 2);
    assert_eq!(all["data"]["per_page"], 15);
    assert_eq!(titles(all), vec!["Shipping", "Payroll"]);

    let technical = server
        .get("/api/diagrams")
        .add_query_param("technical", "TOTAL")
        .authorization_bearer(&owner)
        .await
        .json::<Value>();
    assert_eq!(titles(technical), vec!["Payroll"]);

    let mine = server
        .get("/api/diagrams")
        .add_query_param("my_diagrams", "true")
        .authorization_bearer(&other)
        .await
        .json::<Value>();
    assert_eq!(titles(mine), vec!["Shipping"]);

    let tagged = server
        .get("/api/diagrams")
        .add_query_param("tags", "hr,finance")
        .authorization_bearer(&owner)
        .await
        .json::<Value>();
    assert_eq!(titles(tagged), vec!["Payroll"]);

    let searched = server
        .get("/api/diagrams")
        .add_query_param("search", "overtime")
        .authorization_bearer(&owner)
        .await
        .json::<Value>();
    assert_eq!(titles(searched), vec!["Payroll"]);

    let paged = server
        .get("/api/diagrams")
        .add_query_param("per_page", "1")
        .add_query_param("page", "2")
        .authorization_bearer(&owner)
        .await
        .json::<Value>();
    assert_eq!(paged["data"]["last_page"], 2);
    assert_eq!(titles(paged), vec!["Payroll"]);
}
