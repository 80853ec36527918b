//! # Connections API Handlers
//!
//! Per-user connected flags for each service/integration pair.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{CurrentUser, OperatorAuth, UserHeader};
use crate::catalog::{Integration, Service, is_available};
use crate::error::{ApiError, validation_error};
use crate::models::integration_connection;
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub service: Service,
    pub integration: Integration,
    pub connected: bool,
    /// Whether the pair can be toggled at all
    pub available: bool,
}

impl ConnectionStatus {
    fn new(service: Service, integration: Integration, connected: bool) -> Self {
        Self {
            service,
            integration,
            connected,
            available: is_available(service, integration),
        }
    }

    /// Rows written with names outside the catalog are skipped.
    fn from_row(row: &integration_connection::Model) -> Option<Self> {
        let service = Service::from_display_name(&row.service)?;
        let integration = Integration::from_display_name(&row.integration)?;
        Some(Self::new(service, integration, row.connected))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConnectionsResponse {
    pub connections: Vec<ConnectionStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetConnectionRequest {
    pub connected: bool,
}

fn parse_pair(service: &str, integration: &str) -> Result<(Service, Integration), ApiError> {
    Ok((Service::parse(service)?, Integration::parse(integration)?))
}

fn ensure_available(service: Service, integration: Integration) -> Result<(), ApiError> {
    if is_available(service, integration) {
        Ok(())
    } else {
        Err(validation_error(
            "Integration is not available for this service",
            serde_json::json!({
                "service": service.slug(),
                "integration": integration.slug(),
                "reason": "coming soon",
            }),
        ))
    }
}

/// Lists stored connection flags for the acting user
#[utoipa::path(
    get,
    path = "/connections",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Stored connection flags", body = ConnectionsResponse),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn list_connections(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<ConnectionsResponse>, ApiError> {
    let rows = state.connections().list_for_user(user.id).await?;
    let connections = rows.iter().filter_map(ConnectionStatus::from_row).collect();
    Ok(Json(ConnectionsResponse { connections }))
}

/// Reads one connection flag; a pair never stored reads as not connected
#[utoipa::path(
    get,
    path = "/connections/{service}/{integration}",
    security(("bearer_auth" = [])),
    params(
        UserHeader,
        ("service" = String, Path, description = "paragon, merge or integration-app"),
        ("integration" = String, Path, description = "shopify, magento, zendesk or hubspot")
    ),
    responses(
        (status = 200, description = "Connection flag", body = ConnectionStatus),
        (status = 400, description = "Unknown service or integration", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn get_connection(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
    Path((service, integration)): Path<(String, String)>,
) -> Result<Json<ConnectionStatus>, ApiError> {
    let (service, integration) = parse_pair(&service, &integration)?;
    let connected = state
        .connections()
        .get_status(user.id, service, integration)
        .await?;
    Ok(Json(ConnectionStatus::new(service, integration, connected)))
}

/// Stores a connection flag
#[utoipa::path(
    put,
    path = "/connections/{service}/{integration}",
    security(("bearer_auth" = [])),
    params(
        UserHeader,
        ("service" = String, Path, description = "paragon, merge or integration-app"),
        ("integration" = String, Path, description = "shopify, magento, zendesk or hubspot")
    ),
    request_body = SetConnectionRequest,
    responses(
        (status = 200, description = "Stored flag", body = ConnectionStatus),
        (status = 400, description = "Unknown or unavailable pair", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn set_connection(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
    Path((service, integration)): Path<(String, String)>,
    payload: Result<Json<SetConnectionRequest>, JsonRejection>,
) -> Result<Json<ConnectionStatus>, ApiError> {
    let (service, integration) = parse_pair(&service, &integration)?;
    let Json(request) = payload?;
    ensure_available(service, integration)?;

    let row = state
        .connections()
        .set_status(user.id, service, integration, request.connected)
        .await?;
    Ok(Json(ConnectionStatus::new(service, integration, row.connected)))
}

/// Inverts a connection flag and returns the new value
#[utoipa::path(
    post,
    path = "/connections/{service}/{integration}/toggle",
    security(("bearer_auth" = [])),
    params(
        UserHeader,
        ("service" = String, Path, description = "paragon, merge or integration-app"),
        ("integration" = String, Path, description = "shopify, magento, zendesk or hubspot")
    ),
    responses(
        (status = 200, description = "New flag", body = ConnectionStatus),
        (status = 400, description = "Unknown or unavailable pair", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn toggle_connection(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
    Path((service, integration)): Path<(String, String)>,
) -> Result<Json<ConnectionStatus>, ApiError> {
    let (service, integration) = parse_pair(&service, &integration)?;
    ensure_available(service, integration)?;

    let connected = state
        .connections()
        .toggle(user.id, service, integration)
        .await?;
    tracing::info!(user_id = %user.id, %service, %integration, connected, "connection toggled");
    Ok(Json(ConnectionStatus::new(service, integration, connected)))
}
