//! # Profile API Handlers
//!
//! Read and update the acting user's profile. Secrets are never returned,
//! only whether each one is present.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{CurrentUser, OperatorAuth, UserHeader};
use crate::error::ApiError;
use crate::models::profile;
use crate::repositories::ProfileUpdate;
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileView {
    #[schema(value_type = String)]
    pub user_id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// Merge Agent Handler registered user id
    pub merge_user_id: Option<String>,
    pub merge_handler_id: Option<String>,
    pub has_paragon_token: bool,
    pub has_integration_app_token: bool,
    pub has_merge_link_token: bool,
    pub has_merge_account_token: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<profile::Model> for ProfileView {
    fn from(model: profile::Model) -> Self {
        Self {
            user_id: model.user_id,
            email: model.email,
            full_name: model.full_name,
            merge_user_id: model.merge_user_id,
            merge_handler_id: model.merge_handler_id,
            has_paragon_token: model.paragon_token_ciphertext.is_some(),
            has_integration_app_token: model.integration_app_token_ciphertext.is_some(),
            has_merge_link_token: model.merge_link_token_ciphertext.is_some(),
            has_merge_account_token: model.merge_account_token_ciphertext.is_some(),
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Profile form. Omitted fields are left unchanged; empty strings clear a field.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub paragon_token: Option<String>,
    pub integration_app_token: Option<String>,
    pub merge_handler_id: Option<String>,
    /// Merge Unified account token
    pub merge_ticketing_token: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(request: UpdateProfileRequest) -> Self {
        Self {
            full_name: request.full_name,
            email: request.email,
            paragon_token: request.paragon_token,
            integration_app_token: request.integration_app_token,
            merge_handler_id: request.merge_handler_id,
            merge_ticketing_token: request.merge_ticketing_token,
        }
    }
}

/// Returns the acting user's profile, creating it on first access
#[utoipa::path(
    get,
    path = "/profile",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Profile", body = ProfileView),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
) -> Result<Json<ProfileView>, ApiError> {
    let profile = state
        .profiles()
        .ensure(user.id, user.email.as_deref())
        .await?;
    Ok(Json(profile.into()))
}

/// Applies the profile form
#[utoipa::path(
    patch,
    path = "/profile",
    security(("bearer_auth" = [])),
    params(UserHeader),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileView),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    user: CurrentUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileView>, ApiError> {
    let Json(request) = payload?;

    let profiles = state.profiles();
    profiles.ensure(user.id, user.email.as_deref()).await?;
    let updated = profiles.update_details(user.id, request.into()).await?;

    tracing::info!(user_id = %user.id, "profile updated");
    Ok(Json(updated.into()))
}
