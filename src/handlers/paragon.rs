//! # Paragon API Handlers
//!
//! Session token issuance and sample calls through Paragon's proxy,
//! ActionKit and workflow triggers. Vendor JSON is returned unchanged.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{load_credentials, require};
use crate::auth::{CurrentUser, OperatorAuth, UserHeader};
use crate::error::{ApiError, validation_error};
use crate::server::AppState;

const NO_TOKEN: &str = "No Paragon token found";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionTokenResponse {
    /// Signed user token for the provider's browser SDK
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionKitProductsRequest {
    /// Shopify product ids, as accepted by `SHOPIFY_GET_PRODUCTS`
    pub product_ids: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VariantsRequest {
    pub sku: String,
}

async fn paragon_token(state: &AppState, user: &CurrentUser) -> Result<String, ApiError> {
    let credentials = load_credentials(state, user).await?;
    require(credentials.paragon_token, NO_TOKEN)
}

/// Signs a new Paragon user token and stores it on the profile
#[utoipa::path(
    post,
    path = "/paragon/session",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Paragon user token", body = SessionTokenResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 503, description = "Paragon signing not configured", body = ApiError)
    ),
    tag = "paragon"
)]
pub async fn create_session(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<SessionTokenResponse>, ApiError> {
    let token = state.provisioning().paragon_session(&user).await?;
    Ok(Json(SessionTokenResponse { token }))
}

/// Lists Shopify products through the Paragon proxy
#[utoipa::path(
    get,
    path = "/paragon/shopify/proxy-get-products",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Shopify response", body = Object),
        (status = 400, description = "No Paragon token on profile", body = ApiError),
        (status = 502, description = "Paragon returned an error", body = ApiError)
    ),
    tag = "paragon"
)]
pub async fn shopify_proxy_get_products(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let token = paragon_token(&state, &user).await?;
    let body = state
        .providers
        .paragon
        .shopify_proxy_get_products(&token)
        .await?;
    Ok(Json(body))
}

/// Runs the `SHOPIFY_GET_PRODUCTS` ActionKit action
#[utoipa::path(
    post,
    path = "/paragon/shopify/actionkit-get-products",
    security(("bearer_auth" = [])),
    params(UserHeader),
    request_body = ActionKitProductsRequest,
    responses(
        (status = 200, description = "ActionKit response", body = Object),
        (status = 400, description = "Validation error or missing token", body = ApiError),
        (status = 502, description = "Paragon returned an error", body = ApiError)
    ),
    tag = "paragon"
)]
pub async fn shopify_actionkit_get_products(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
    payload: Result<Json<ActionKitProductsRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let token = paragon_token(&state, &user).await?;
    let body = state
        .providers
        .paragon
        .shopify_actionkit_get_products(&token, &request.product_ids)
        .await?;
    Ok(Json(body))
}

/// Lists Magento products through the Paragon custom integration proxy
#[utoipa::path(
    get,
    path = "/paragon/magento/proxy-get-products",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Magento response", body = Object),
        (status = 400, description = "No Paragon token on profile", body = ApiError),
        (status = 502, description = "Paragon returned an error", body = ApiError)
    ),
    tag = "paragon"
)]
pub async fn magento_proxy_get_products(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let token = paragon_token(&state, &user).await?;
    let body = state
        .providers
        .paragon
        .magento_proxy_get_products(&token)
        .await?;
    Ok(Json(body))
}

/// Triggers the Magento "get products" workflow
#[utoipa::path(
    post,
    path = "/paragon/magento/workflow-get-products",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Workflow response", body = Object),
        (status = 400, description = "No Paragon token on profile", body = ApiError),
        (status = 502, description = "Paragon returned an error", body = ApiError)
    ),
    tag = "paragon"
)]
pub async fn magento_workflow_get_products(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let token = paragon_token(&state, &user).await?;
    let body = state
        .providers
        .paragon
        .magento_workflow_get_products(&token)
        .await?;
    Ok(Json(body))
}

/// Triggers the Magento "get variants" workflow for one SKU
#[utoipa::path(
    post,
    path = "/paragon/magento/workflow-get-variants",
    security(("bearer_auth" = [])),
    params(UserHeader),
    request_body = VariantsRequest,
    responses(
        (status = 200, description = "Workflow response", body = Object),
        (status = 400, description = "Validation error or missing token", body = ApiError),
        (status = 502, description = "Paragon returned an error", body = ApiError)
    ),
    tag = "paragon"
)]
pub async fn magento_workflow_get_variants(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
    payload: Result<Json<VariantsRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let sku = request.sku.trim();
    if sku.is_empty() {
        return Err(validation_error(
            "SKU is required",
            serde_json::json!({ "sku": "Must not be empty" }),
        ));
    }

    let token = paragon_token(&state, &user).await?;
    let body = state
        .providers
        .paragon
        .magento_workflow_get_variants(&token, sku)
        .await?;
    Ok(Json(body))
}
