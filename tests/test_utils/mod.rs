//! Shared helpers for integration tests: an in-memory database, a test
//! configuration and request builders for the router.

#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::AUTHORIZATION},
};
use ipaas_dashboard::{
    auth::{USER_EMAIL_HEADER, USER_ID_HEADER},
    config::AppConfig,
    crypto::CryptoKey,
    repositories::{IntegrationConnectionRepository, ProfileRepository},
    server::{AppState, create_app},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const OPERATOR_TOKEN: &str = "integration-test-token";
pub const TEST_KEY: [u8; 32] = [42u8; 32];
pub const PARAGON_PRIVATE_KEY: &str = include_str!("../fixtures/paragon_test_key.pem");
pub const PARAGON_PUBLIC_KEY: &str = include_str!("../fixtures/paragon_test_key.pub.pem");

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Configuration for the `test` profile with every vendor pointed at `base`.
pub fn test_config(base: &str) -> AppConfig {
    let mut config = AppConfig {
        profile: "test".to_string(),
        operator_tokens: vec![OPERATOR_TOKEN.to_string()],
        crypto_key: Some(TEST_KEY.to_vec()),
        http_timeout_ms: 5_000,
        ..Default::default()
    };

    config.paragon.project_id = Some("proj-test".to_string());
    config.paragon.signing_key = Some(PARAGON_PRIVATE_KEY.to_string());
    config.paragon.magento_integration_id = Some("custom-magento".to_string());
    config.paragon.proxy_base = base.to_string();
    config.paragon.actionkit_base = base.to_string();
    config.paragon.zeus_base = base.to_string();

    config.integration_app.workspace_key = Some("ws-key".to_string());
    config.integration_app.workspace_secret = Some("ws-secret".to_string());
    config.integration_app.api_base = base.to_string();

    config.merge.api_key = Some("merge-handler-key".to_string());
    config.merge.unified_api_key = Some("merge-unified-key".to_string());
    config.merge.handler_api_base = base.to_string();
    config.merge.unified_api_base = base.to_string();

    config
}

pub fn profile_repository(db: &DatabaseConnection) -> ProfileRepository {
    let key = CryptoKey::new(TEST_KEY.to_vec()).expect("valid test key");
    ProfileRepository::new(Arc::new(db.clone()), key)
}

pub fn connection_repository(db: &DatabaseConnection) -> IntegrationConnectionRepository {
    IntegrationConnectionRepository::new(Arc::new(db.clone()))
}

/// Router plus the database behind it.
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

impl TestApp {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let db = setup_test_db().await?;
        let state = AppState::new(config, db.clone())?;
        Ok(Self {
            router: create_app(state),
            db,
        })
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

/// An authenticated request acting for `user`.
pub fn user_request(
    method: Method,
    uri: &str,
    user: Uuid,
    email: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {}", OPERATOR_TOKEN))
        .header(USER_ID_HEADER, user.to_string());
    if let Some(email) = email {
        builder = builder.header(USER_EMAIL_HEADER, email);
    }

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    }
}
