//! Signs short-lived user tokens for Paragon and Integration App.
//!
//! Paragon expects an RS256 JWT whose audience names the project; Integration
//! App expects an HS512 JWT signed with the workspace secret.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{IntegrationAppConfig, ParagonConfig};

#[derive(Debug, Error)]
pub enum TokenIssuerError {
    #[error("{provider} token signing is not configured: missing {setting}")]
    NotConfigured {
        provider: &'static str,
        setting: &'static str,
    },
    #[error("invalid {provider} signing key: {source}")]
    InvalidKey {
        provider: &'static str,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("failed to sign {provider} token: {source}")]
    Signing {
        provider: &'static str,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

/// Claims of a Paragon user token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParagonClaims {
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of an Integration App user token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationAppClaims {
    pub workspace_key: String,
    pub id: String,
    pub name: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub iat: i64,
    pub exp: i64,
}

/// Issues provider tokens from the configured signing material.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    paragon: ParagonConfig,
    integration_app: IntegrationAppConfig,
}

impl TokenIssuer {
    pub fn new(paragon: ParagonConfig, integration_app: IntegrationAppConfig) -> Self {
        Self {
            paragon,
            integration_app,
        }
    }

    pub fn paragon_claims(&self, user_id: Uuid) -> Result<ParagonClaims, TokenIssuerError> {
        let project_id =
            self.paragon
                .project_id
                .as_deref()
                .ok_or(TokenIssuerError::NotConfigured {
                    provider: "paragon",
                    setting: "project id",
                })?;

        let iat = Utc::now().timestamp();
        Ok(ParagonClaims {
            sub: format!("{}/{}", user_id, self.paragon.subject_suffix),
            aud: format!("useparagon.com/{}", project_id),
            iat,
            exp: iat + self.paragon.token_ttl_seconds as i64,
        })
    }

    /// Sign an RS256 Paragon token for `user_id`.
    pub fn sign_paragon_token(&self, user_id: Uuid) -> Result<String, TokenIssuerError> {
        let pem = self
            .paragon
            .signing_key
            .as_deref()
            .ok_or(TokenIssuerError::NotConfigured {
                provider: "paragon",
                setting: "signing key",
            })?;
        let claims = self.paragon_claims(user_id)?;

        let key = EncodingKey::from_rsa_pem(normalize_pem(pem).as_bytes()).map_err(|source| {
            TokenIssuerError::InvalidKey {
                provider: "paragon",
                source,
            }
        })?;

        encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|source| {
            TokenIssuerError::Signing {
                provider: "paragon",
                source,
            }
        })
    }

    /// Sign an HS512 Integration App token for `user_id` under `user_name`.
    pub fn sign_integration_app_token(
        &self,
        user_id: Uuid,
        user_name: &str,
    ) -> Result<String, TokenIssuerError> {
        let workspace_key = self.integration_app.workspace_key.as_deref().ok_or(
            TokenIssuerError::NotConfigured {
                provider: "integration-app",
                setting: "workspace key",
            },
        )?;
        let secret = self.integration_app.workspace_secret.as_deref().ok_or(
            TokenIssuerError::NotConfigured {
                provider: "integration-app",
                setting: "workspace secret",
            },
        )?;

        let iat = Utc::now().timestamp();
        let claims = IntegrationAppClaims {
            workspace_key: workspace_key.to_string(),
            id: user_id.to_string(),
            name: user_name.to_string(),
            fields: serde_json::Map::new(),
            iat,
            exp: iat + self.integration_app.token_ttl_seconds as i64,
        };

        encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|source| TokenIssuerError::Signing {
            provider: "integration-app",
            source,
        })
    }
}

/// Keys pasted into a single env var often carry literal `\n` sequences.
fn normalize_pem(pem: &str) -> String {
    pem.trim().replace("\\n", "\n")
}
