//! # Merge API Handlers
//!
//! Agent Handler registration, Merge Link tokens and the ticketing calls
//! made with the stored account token.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{load_credentials, require};
use crate::auth::{CurrentUser, OperatorAuth, UserHeader};
use crate::catalog::{Integration, Service, is_available};
use crate::error::{ApiError, validation_error};
use crate::provisioning::{MergeSession, ProvisioningError};
use crate::server::AppState;

const NO_ACCOUNT_TOKEN: &str = "No Merge account token found";
const DEFAULT_CATEGORY: &str = "ticketing";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LinkTokenRequest {
    /// Integration slug, e.g. "zendesk"
    pub integration: String,
    /// Merge categories; defaults to `["ticketing"]`
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LinkTokenResponse {
    pub link_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExchangeTokenRequest {
    /// Public token returned by Merge Link
    pub public_token: String,
    /// Integration being linked; defaults to "zendesk"
    pub integration: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExchangeTokenResponse {
    pub account_token: String,
}

fn merge_integration(slug: Option<&str>) -> Result<Integration, ApiError> {
    let integration = match slug {
        Some(slug) => Integration::parse(slug)?,
        None => Integration::Zendesk,
    };

    if !is_available(Service::Merge, integration) {
        return Err(validation_error(
            "Integration is not available through Merge",
            serde_json::json!({ "integration": integration.slug() }),
        ));
    }
    Ok(integration)
}

async fn account_token(state: &AppState, user: &CurrentUser) -> Result<String, ApiError> {
    let credentials = load_credentials(state, user).await?;
    require(credentials.merge_account_token, NO_ACCOUNT_TOKEN)
}

/// Registers the user with Merge Agent Handler on first visit
#[utoipa::path(
    post,
    path = "/merge/session",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Registered user and link token", body = MergeSession),
        (status = 400, description = "No email known for the user", body = ApiError),
        (status = 502, description = "Merge returned an error", body = ApiError),
        (status = 503, description = "Merge not configured", body = ApiError)
    ),
    tag = "merge"
)]
pub async fn create_session(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<MergeSession>, ApiError> {
    let session = state.provisioning().merge_session(&user).await?;
    Ok(Json(session))
}

/// Creates a Merge Link token for a Unified API integration
#[utoipa::path(
    post,
    path = "/merge/link-token",
    security(("bearer_auth" = [])),
    params(UserHeader),
    request_body = LinkTokenRequest,
    responses(
        (status = 200, description = "Link token", body = LinkTokenResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 502, description = "Merge returned an error", body = ApiError)
    ),
    tag = "merge"
)]
pub async fn create_link_token(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
    payload: Result<Json<LinkTokenRequest>, JsonRejection>,
) -> Result<Json<LinkTokenResponse>, ApiError> {
    let Json(request) = payload?;
    let integration = merge_integration(Some(&request.integration))?;
    let categories = request
        .categories
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_CATEGORY.to_string()]);

    let profile = state
        .profiles()
        .ensure(user.id, user.email.as_deref())
        .await?;
    let email = profile
        .email
        .as_deref()
        .or(user.email.as_deref())
        .ok_or(ProvisioningError::MissingEmail("Merge"))?;

    let link_token = state
        .providers
        .merge_unified
        .create_link_token(user.id, email, &categories, integration.slug())
        .await?;
    Ok(Json(LinkTokenResponse { link_token }))
}

/// Exchanges a Merge Link public token and marks the integration connected
#[utoipa::path(
    post,
    path = "/merge/exchange-token",
    security(("bearer_auth" = [])),
    params(UserHeader),
    request_body = ExchangeTokenRequest,
    responses(
        (status = 200, description = "Account token", body = ExchangeTokenResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 502, description = "Merge returned an error", body = ApiError)
    ),
    tag = "merge"
)]
pub async fn exchange_token(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
    payload: Result<Json<ExchangeTokenRequest>, JsonRejection>,
) -> Result<Json<ExchangeTokenResponse>, ApiError> {
    let Json(request) = payload?;
    let public_token = request.public_token.trim();
    if public_token.is_empty() {
        return Err(validation_error(
            "public_token is required",
            serde_json::json!({ "public_token": "Must not be empty" }),
        ));
    }
    let integration = merge_integration(request.integration.as_deref())?;

    let account_token = state
        .provisioning()
        .merge_exchange(user.id, public_token, integration)
        .await?;
    Ok(Json(ExchangeTokenResponse { account_token }))
}

/// Lists tickets through the Merge Unified ticketing API
#[utoipa::path(
    get,
    path = "/merge/tickets",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Merge ticket page", body = Object),
        (status = 400, description = "No Merge account token on profile", body = ApiError),
        (status = 502, description = "Merge returned an error", body = ApiError)
    ),
    tag = "merge"
)]
pub async fn get_tickets(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let token = account_token(&state, &user).await?;
    let body = state.providers.merge_unified.get_tickets(&token).await?;
    Ok(Json(body))
}

/// Lists Zendesk's own ticket payload through Merge passthrough
#[utoipa::path(
    get,
    path = "/merge/tickets/raw",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Passthrough response", body = Object),
        (status = 400, description = "No Merge account token on profile", body = ApiError),
        (status = 502, description = "Merge returned an error", body = ApiError)
    ),
    tag = "merge"
)]
pub async fn get_tickets_raw(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let token = account_token(&state, &user).await?;
    let body = state.providers.merge_unified.get_tickets_raw(&token).await?;
    Ok(Json(body))
}
