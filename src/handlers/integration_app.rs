//! # Integration App API Handlers

use axum::{body::Bytes, extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::paragon::SessionTokenResponse;
use super::{load_credentials, require};
use crate::auth::{CurrentUser, OperatorAuth, UserHeader};
use crate::error::{ApiError, validation_error};
use crate::server::AppState;

const NO_TOKEN: &str = "No Integration App token found";

/// Optional pagination cursor from a previous page
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CursorRequest {
    pub cursor: Option<String>,
}

async fn integration_app_token(state: &AppState, user: &CurrentUser) -> Result<String, ApiError> {
    let credentials = load_credentials(state, user).await?;
    require(credentials.integration_app_token, NO_TOKEN)
}

/// An empty body means "no cursor".
fn cursor_of(body: &Bytes) -> Result<Option<String>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice::<CursorRequest>(body)
        .map(|request| request.cursor)
        .map_err(|err| {
            validation_error(
                "Invalid request body",
                serde_json::json!({ "body": err.to_string() }),
            )
        })
}

/// Signs a new Integration App user token and stores it on the profile
#[utoipa::path(
    post,
    path = "/integration-app/session",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Integration App user token", body = SessionTokenResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 503, description = "Integration App signing not configured", body = ApiError)
    ),
    tag = "integration-app"
)]
pub async fn create_session(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<SessionTokenResponse>, ApiError> {
    let token = state.provisioning().integration_app_session(&user).await?;
    Ok(Json(SessionTokenResponse { token }))
}

/// Runs the Shopify `get-products` action
#[utoipa::path(
    post,
    path = "/integration-app/shopify/get-products",
    security(("bearer_auth" = [])),
    params(UserHeader),
    request_body(content = CursorRequest, description = "Optional cursor"),
    responses(
        (status = 200, description = "Action output", body = Object),
        (status = 400, description = "No Integration App token on profile", body = ApiError),
        (status = 502, description = "Integration App returned an error", body = ApiError)
    ),
    tag = "integration-app"
)]
pub async fn shopify_get_products(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let cursor = cursor_of(&body)?;
    let token = integration_app_token(&state, &user).await?;
    let body = state
        .providers
        .integration_app
        .shopify_get_products(&token, cursor.as_deref())
        .await?;
    Ok(Json(body))
}

/// Lists the raw Shopify products data source
#[utoipa::path(
    post,
    path = "/integration-app/shopify/get-products-raw",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Collection listing", body = Object),
        (status = 400, description = "No Integration App token on profile", body = ApiError),
        (status = 502, description = "Integration App returned an error", body = ApiError)
    ),
    tag = "integration-app"
)]
pub async fn shopify_get_products_raw(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let token = integration_app_token(&state, &user).await?;
    let body = state
        .providers
        .integration_app
        .shopify_get_products_raw(&token)
        .await?;
    Ok(Json(body))
}

/// Runs the Magento (adobe-commerce) `get-products` action
#[utoipa::path(
    post,
    path = "/integration-app/magento/get-products",
    security(("bearer_auth" = [])),
    params(UserHeader),
    request_body(content = CursorRequest, description = "Optional cursor"),
    responses(
        (status = 200, description = "Action output", body = Object),
        (status = 400, description = "No Integration App token on profile", body = ApiError),
        (status = 502, description = "Integration App returned an error", body = ApiError)
    ),
    tag = "integration-app"
)]
pub async fn magento_get_products(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let cursor = cursor_of(&body)?;
    let token = integration_app_token(&state, &user).await?;
    let body = state
        .providers
        .integration_app
        .magento_get_products(&token, cursor.as_deref())
        .await?;
    Ok(Json(body))
}

/// Lists the raw Magento products data source
#[utoipa::path(
    post,
    path = "/integration-app/magento/get-products-raw",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Collection listing", body = Object),
        (status = 400, description = "No Integration App token on profile", body = ApiError),
        (status = 502, description = "Integration App returned an error", body = ApiError)
    ),
    tag = "integration-app"
)]
pub async fn magento_get_products_raw(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let token = integration_app_token(&state, &user).await?;
    let body = state
        .providers
        .integration_app
        .magento_get_products_raw(&token)
        .await?;
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_has_no_cursor() {
        assert_eq!(cursor_of(&Bytes::new()).unwrap(), None);
        assert_eq!(cursor_of(&Bytes::from_static(b"  ")).unwrap(), None);
    }

    #[test]
    fn cursor_is_read_from_json() {
        let body = Bytes::from_static(br#"{"cursor":"abc"}"#);
        assert_eq!(cursor_of(&body).unwrap().as_deref(), Some("abc"));
        assert_eq!(cursor_of(&Bytes::from_static(b"{}")).unwrap(), None);
    }

    #[test]
    fn malformed_body_is_rejected() {
        let err = cursor_of(&Bytes::from_static(b"{cursor")).unwrap_err();
        assert_eq!(err.code, Box::from("VALIDATION_FAILED"));
    }
}
