//! Session flows run when a user opens a provider area of the dashboard.
//!
//! Each flow combines token signing or a vendor call with a profile write.

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::catalog::{Integration, Service, is_available};
use crate::connectors::{ConnectorError, Providers};
use crate::error::{ApiError, validation_error};
use crate::repositories::{IntegrationConnectionRepository, ProfileRepository};
use crate::token_issuer::{TokenIssuer, TokenIssuerError};

/// Name used in the Integration App token when the profile has none.
pub const DEFAULT_USER_NAME: &str = "User";

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error(transparent)]
    Token(#[from] TokenIssuerError),
    #[error(transparent)]
    Connector(#[from] ConnectorError),
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
    #[error("an email address is required to register with {0}")]
    MissingEmail(&'static str),
    #[error("{service} does not offer {integration}")]
    Unavailable {
        service: Service,
        integration: Integration,
    },
}

impl From<ProvisioningError> for ApiError {
    fn from(error: ProvisioningError) -> Self {
        match error {
            ProvisioningError::Token(e) => e.into(),
            ProvisioningError::Connector(e) => e.into(),
            ProvisioningError::Storage(e) => e.into(),
            ProvisioningError::MissingEmail(provider) => validation_error(
                &format!("An email address is required to register with {}", provider),
                serde_json::json!({ "email": "Set it on the profile or send X-User-Email" }),
            ),
            ProvisioningError::Unavailable {
                service,
                integration,
            } => ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED".to_string(),
                format!(
                    "{} is not available through {}",
                    integration.display_name(),
                    service.display_name()
                ),
            ),
        }
    }
}

/// Outcome of the Merge session flow.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct MergeSession {
    /// Agent Handler registered user id
    pub registered_user_id: String,
    /// Agent Handler link token, when one has been issued
    pub link_token: Option<String>,
    /// Whether this call registered the user and issued the link token
    pub provisioned: bool,
}

#[derive(Debug, Clone)]
pub struct Provisioning {
    profiles: ProfileRepository,
    connections: IntegrationConnectionRepository,
    issuer: TokenIssuer,
    providers: Providers,
    merge_connector: String,
}

impl Provisioning {
    pub fn new(
        profiles: ProfileRepository,
        connections: IntegrationConnectionRepository,
        issuer: TokenIssuer,
        providers: Providers,
        merge_connector: String,
    ) -> Self {
        Self {
            profiles,
            connections,
            issuer,
            providers,
            merge_connector,
        }
    }

    /// Sign a fresh Paragon token and store it on the profile.
    pub async fn paragon_session(&self, user: &CurrentUser) -> Result<String, ProvisioningError> {
        let token = self.issuer.sign_paragon_token(user.id)?;
        self.profiles.ensure(user.id, user.email.as_deref()).await?;
        self.profiles.store_paragon_token(user.id, &token).await?;
        tracing::info!(user_id = %user.id, "issued Paragon user token");
        Ok(token)
    }

    /// Sign a fresh Integration App token named after the profile's full name.
    pub async fn integration_app_session(
        &self,
        user: &CurrentUser,
    ) -> Result<String, ProvisioningError> {
        let profile = self.profiles.ensure(user.id, user.email.as_deref()).await?;
        let name = profile
            .full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_USER_NAME);

        let token = self.issuer.sign_integration_app_token(user.id, name)?;
        self.profiles
            .store_integration_app_token(user.id, &token)
            .await?;
        tracing::info!(user_id = %user.id, "issued Integration App user token");
        Ok(token)
    }

    /// Register the user with Merge Agent Handler on first visit.
    ///
    /// A profile that already carries a registered user id is returned as-is.
    pub async fn merge_session(&self, user: &CurrentUser) -> Result<MergeSession, ProvisioningError> {
        let profile = self.profiles.ensure(user.id, user.email.as_deref()).await?;

        if let Some(registered_user_id) = profile.merge_user_id.clone() {
            let credentials = self.profiles.credentials(&profile)?;
            return Ok(MergeSession {
                registered_user_id,
                link_token: credentials.merge_link_token,
                provisioned: false,
            });
        }

        let email = profile
            .email
            .as_deref()
            .or(user.email.as_deref())
            .ok_or(ProvisioningError::MissingEmail("Merge"))?;

        let handler = &self.providers.merge_handler;
        let registered_user_id = handler.ensure_registered_user(user.id, email).await?;
        let link_token = handler
            .create_link_token(&registered_user_id, &self.merge_connector)
            .await?;

        self.profiles
            .store_merge_registration(user.id, &registered_user_id, Some(&link_token))
            .await?;

        Ok(MergeSession {
            registered_user_id,
            link_token: Some(link_token),
            provisioned: true,
        })
    }

    /// Exchange a Merge Link public token, store the account token and mark
    /// the (Merge, integration) pair connected.
    pub async fn merge_exchange(
        &self,
        user_id: Uuid,
        public_token: &str,
        integration: Integration,
    ) -> Result<String, ProvisioningError> {
        if !is_available(Service::Merge, integration) {
            return Err(ProvisioningError::Unavailable {
                service: Service::Merge,
                integration,
            });
        }

        let account_token = self
            .providers
            .merge_unified
            .exchange_account_token(public_token)
            .await?;

        self.profiles
            .store_merge_account_token(user_id, &account_token)
            .await?;
        self.connections
            .set_status(user_id, Service::Merge, integration, true)
            .await?;

        tracing::info!(%user_id, %integration, "Merge account linked");
        Ok(account_token)
    }
}
