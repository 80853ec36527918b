//! Router-level tests for the handlers, backed by in-memory SQLite.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::AUTHORIZATION},
};
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::auth::{USER_EMAIL_HEADER, USER_ID_HEADER};
use crate::config::AppConfig;
use crate::migration::{Migrator, MigratorTrait};
use crate::models::ServiceInfo;
use crate::server::{AppState, create_app};

const TOKEN: &str = "handler-test-token";
const USER: &str = "0b7e3c5a-4d2f-4f1e-9a6b-1c2d3e4f5a6b";

async fn test_app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let config = AppConfig {
        profile: "test".to_string(),
        operator_tokens: vec![TOKEN.to_string()],
        crypto_key: Some(vec![7u8; 32]),
        ..Default::default()
    };
    create_app(AppState::new(config, db).unwrap())
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(USER_ID_HEADER, USER)
        .header(USER_EMAIL_HEADER, "grace@example.com");

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn root_is_public_and_describes_the_service() {
    let app = test_app().await;
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "ipaas-dashboard");
    assert_eq!(body["version"], ServiceInfo::default().version);
}

#[tokio::test]
async fn probes_report_healthy() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Request::builder().uri("/healthz").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(
        &app,
        Request::builder().uri("/readyz").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn protected_routes_require_operator_token() {
    let app = test_app().await;
    let request = Request::builder()
        .uri("/services")
        .header(USER_ID_HEADER, USER)
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn services_lists_full_catalog() {
    let app = test_app().await;
    let (status, body) = send(&app, request(Method::GET, "/services", None)).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 12);
    let available = entries
        .iter()
        .filter(|entry| entry["available"] == true)
        .count();
    assert_eq!(available, 6);
}

#[tokio::test]
async fn profile_is_created_on_first_read() {
    let app = test_app().await;
    let (status, body) = send(&app, request(Method::GET, "/profile", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], USER);
    assert_eq!(body["email"], "grace@example.com");
    assert_eq!(body["has_paragon_token"], false);
}

#[tokio::test]
async fn profile_update_hides_secrets() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        request(
            Method::PATCH,
            "/profile",
            Some(json!({ "full_name": "Grace Hopper", "paragon_token": "pt-secret" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Grace Hopper");
    assert_eq!(body["has_paragon_token"], true);
    assert!(!body.to_string().contains("pt-secret"));
}

#[tokio::test]
async fn profile_update_rejects_unknown_fields() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        request(Method::PATCH, "/profile", Some(json!({ "nickname": "g" }))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn unknown_connection_reads_as_disconnected() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        request(Method::GET, "/connections/paragon/shopify", None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], false);
    assert_eq!(body["available"], true);
}

#[tokio::test]
async fn toggle_flips_and_lists_connection() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        request(Method::POST, "/connections/integration-app/magento/toggle", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], true);

    let (_, body) = send(&app, request(Method::GET, "/connections", None)).await;
    let connections = body["connections"].as_array().unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0]["service"], "integration-app");
    assert_eq!(connections[0]["integration"], "magento");

    let (_, body) = send(
        &app,
        request(Method::POST, "/connections/integration-app/magento/toggle", None),
    )
    .await;
    assert_eq!(body["connected"], false);
}

#[tokio::test]
async fn unavailable_pair_cannot_be_set() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            "/connections/paragon/hubspot",
            Some(json!({ "connected": true })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["reason"], "coming soon");
}

#[tokio::test]
async fn unknown_service_is_rejected() {
    let app = test_app().await;
    let (status, _) = send(
        &app,
        request(Method::GET, "/connections/zapier/shopify", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn proxy_without_stored_token_is_credential_missing() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        request(Method::GET, "/paragon/shopify/proxy-get-products", None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CREDENTIAL_MISSING");
    assert_eq!(body["message"], "No Paragon token found");
}

#[tokio::test]
async fn paragon_session_without_signing_key_is_503() {
    let app = test_app().await;
    let (status, body) = send(&app, request(Method::POST, "/paragon/session", None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn integration_app_session_signs_with_workspace_secret() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let mut config = AppConfig {
        profile: "test".to_string(),
        operator_tokens: vec![TOKEN.to_string()],
        crypto_key: Some(vec![7u8; 32]),
        ..Default::default()
    };
    config.integration_app.workspace_key = Some("ws-key".to_string());
    config.integration_app.workspace_secret = Some("ws-secret".to_string());
    let app = create_app(AppState::new(config, db).unwrap());

    let (status, body) = send(
        &app,
        request(Method::POST, "/integration-app/session", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);

    let (_, profile) = send(&app, request(Method::GET, "/profile", None)).await;
    assert_eq!(profile["has_integration_app_token"], true);
}

#[tokio::test]
async fn merge_exchange_requires_public_token() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/merge/exchange-token",
            Some(json!({ "public_token": "  " })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "public_token is required");
}

#[tokio::test]
async fn merge_tickets_without_account_token_is_credential_missing() {
    let app = test_app().await;
    let (status, body) = send(&app, request(Method::GET, "/merge/tickets", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No Merge account token found");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/merge/exchange-token"].is_object());
    assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[tokio::test]
async fn request_id_is_echoed_and_used_as_trace_id() {
    let app = test_app().await;
    let request = Request::builder()
        .uri("/services")
        .header("x-request-id", "req-abc-123")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-abc-123");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["trace_id"], "req-abc-123");
}
