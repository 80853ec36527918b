//! Merge Agent Handler registered users and link tokens.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument};
use uuid::Uuid;

use super::http::{ConnectorError, authorize, endpoint, require_str, send_json};
use crate::config::MergeConfig;

const PROVIDER: &str = "merge";

#[derive(Debug, Default, Deserialize)]
struct RegisteredUserPage {
    #[serde(default)]
    results: Vec<Value>,
}

impl RegisteredUserPage {
    /// Id of the entry whose `origin_user_id` matches. Malformed entries are skipped.
    fn id_for(&self, origin_user_id: &str) -> Option<String> {
        self.results
            .iter()
            .filter(|user| {
                user.get("origin_user_id").and_then(Value::as_str) == Some(origin_user_id)
            })
            .find_map(|user| user.get("id").and_then(Value::as_str))
            .map(str::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct MergeHandlerClient {
    http: Client,
    config: MergeConfig,
}

impl MergeHandlerClient {
    pub fn new(http: Client, config: MergeConfig) -> Self {
        Self { http, config }
    }

    fn api_key(&self) -> Result<&str, ConnectorError> {
        self.config
            .api_key
            .as_deref()
            .ok_or(ConnectorError::NotConfigured {
                provider: PROVIDER,
                setting: "agent handler api key",
            })
    }

    fn users_url(&self) -> String {
        endpoint(&self.config.handler_api_base, "/api/v1/registered-users")
    }

    /// Id of the registered user whose `origin_user_id` is `user_id`, if any.
    #[instrument(skip(self))]
    pub async fn find_registered_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<String>, ConnectorError> {
        let body = send_json(
            PROVIDER,
            authorize(self.http.get(self.users_url()), self.api_key()?),
        )
        .await?;

        let page: RegisteredUserPage = match body {
            Value::Null => RegisteredUserPage::default(),
            other => serde_json::from_value(other).map_err(|e| {
                ConnectorError::InvalidResponse {
                    provider: PROVIDER,
                    message: e.to_string(),
                }
            })?,
        };

        Ok(page.id_for(&user_id.to_string()))
    }

    /// Register `user_id` under the configured shared credential group.
    #[instrument(skip(self, email))]
    pub async fn create_registered_user(
        &self,
        user_id: Uuid,
        email: &str,
    ) -> Result<String, ConnectorError> {
        let body = json!({
            "origin_user_id": user_id.to_string(),
            "origin_user_name": email,
            "shared_credential_group": {
                "origin_company_id": self.config.origin_company_id,
                "origin_company_name": self.config.origin_company_name,
                "custom_groupings": {},
            },
            "user_type": "HUMAN",
        });

        let response = send_json(
            PROVIDER,
            authorize(self.http.post(self.users_url()), self.api_key()?).json(&body),
        )
        .await?;
        require_str(PROVIDER, &response, "id")
    }

    #[instrument(skip(self))]
    pub async fn create_link_token(
        &self,
        registered_user_id: &str,
        connector: &str,
    ) -> Result<String, ConnectorError> {
        let url = endpoint(
            &self.config.handler_api_base,
            &format!("/api/v1/registered-users/{}/link-token", registered_user_id),
        );
        let response = send_json(
            PROVIDER,
            authorize(self.http.post(url), self.api_key()?).json(&json!({ "connector": connector })),
        )
        .await?;
        require_str(PROVIDER, &response, "link_token")
    }

    /// Look the user up and register them when absent.
    ///
    /// Two sequential calls with no locking; concurrent first sessions for the
    /// same user can both create a registration.
    pub async fn ensure_registered_user(
        &self,
        user_id: Uuid,
        email: &str,
    ) -> Result<String, ConnectorError> {
        if let Some(existing) = self.find_registered_user(user_id).await? {
            return Ok(existing);
        }

        let created = self.create_registered_user(user_id, email).await?;
        info!(%user_id, registered_user_id = %created, "registered user with Merge Agent Handler");
        Ok(created)
    }
}
