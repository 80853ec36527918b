//! # API Handlers
//!
//! HTTP endpoints of the iPaaS dashboard API.

pub mod catalog;
pub mod connections;
pub mod integration_app;
pub mod merge;
pub mod paragon;
pub mod profile;

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::db;
use crate::error::{ApiError, credential_missing};
use crate::models::ServiceInfo;
use crate::repositories::ProfileCredentials;
use crate::server::AppState;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Process is up", body = HealthStatus)),
    tag = "root"
)]
pub async fn healthz() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}

/// Readiness probe; pings the database
#[utoipa::path(
    get,
    path = "/readyz",
    responses(
        (status = 200, description = "Database reachable", body = HealthStatus),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn readyz(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    db::health_check(&state.db).await.map_err(|err| {
        tracing::warn!(error = %err, "readiness check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database unavailable",
        )
    })?;

    Ok(Json(HealthStatus {
        status: "ready".to_string(),
    }))
}

/// Decrypted credentials of the acting user's profile (empty when no profile exists).
pub(crate) async fn load_credentials(
    state: &AppState,
    user: &CurrentUser,
) -> Result<ProfileCredentials, ApiError> {
    let profiles = state.profiles();
    match profiles.find(user.id).await? {
        Some(profile) => Ok(profiles.credentials(&profile)?),
        None => Ok(ProfileCredentials::default()),
    }
}

/// Unwrap a credential or fail with `CREDENTIAL_MISSING`.
pub(crate) fn require(credential: Option<String>, message: &str) -> Result<String, ApiError> {
    credential
        .filter(|value| !value.is_empty())
        .ok_or_else(|| credential_missing(message))
}

#[cfg(test)]
mod tests;
