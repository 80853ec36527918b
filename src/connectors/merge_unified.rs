//! Merge Unified API: link tokens, account token exchange and ticketing.

use reqwest::{Client, RequestBuilder, Url};
use serde_json::{Value, json};
use tracing::instrument;
use uuid::Uuid;

use super::http::{ConnectorError, authorize, endpoint, require_str, send_json};
use crate::config::MergeConfig;

const PROVIDER: &str = "merge";
const ACCOUNT_TOKEN_HEADER: &str = "X-Account-Token";

#[derive(Debug, Clone)]
pub struct MergeUnifiedClient {
    http: Client,
    config: MergeConfig,
}

impl MergeUnifiedClient {
    pub fn new(http: Client, config: MergeConfig) -> Self {
        Self { http, config }
    }

    fn request(
        &self,
        request: RequestBuilder,
        account_token: Option<&str>,
    ) -> Result<RequestBuilder, ConnectorError> {
        let api_key = self
            .config
            .unified_api_key
            .as_deref()
            .ok_or(ConnectorError::NotConfigured {
                provider: PROVIDER,
                setting: "unified api key",
            })?;

        let request = authorize(request, api_key);
        Ok(match account_token {
            Some(token) => request.header(ACCOUNT_TOKEN_HEADER, token),
            None => request,
        })
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.config.unified_api_base, path)
    }

    /// Create a Merge Link token for the user's organization.
    #[instrument(skip(self, email))]
    pub async fn create_link_token(
        &self,
        user_id: Uuid,
        email: &str,
        categories: &[String],
        integration: &str,
    ) -> Result<String, ConnectorError> {
        let body = json!({
            "end_user_origin_id": user_id.to_string(),
            "end_user_organization_name": self.config.origin_company_name,
            "end_user_email_address": email,
            "categories": categories,
            "integration": integration,
        });

        let request = self.request(
            self.http
                .post(self.url("/api/integrations/create-link-token"))
                .json(&body),
            None,
        )?;
        let response = send_json(PROVIDER, request).await?;
        require_str(PROVIDER, &response, "link_token")
    }

    /// Swap the public token returned by Merge Link for a long-lived account token.
    #[instrument(skip_all)]
    pub async fn exchange_account_token(
        &self,
        public_token: &str,
    ) -> Result<String, ConnectorError> {
        let mut url = Url::parse(&self.url("/api/integrations/account-token")).map_err(|_| {
            ConnectorError::NotConfigured {
                provider: PROVIDER,
                setting: "unified api base",
            }
        })?;
        url.path_segments_mut()
            .map_err(|_| ConnectorError::NotConfigured {
                provider: PROVIDER,
                setting: "unified api base",
            })?
            .push(public_token);

        let request = self.request(self.http.get(url), None)?;
        let response = send_json(PROVIDER, request).await?;
        require_str(PROVIDER, &response, "account_token")
    }

    #[instrument(skip_all)]
    pub async fn get_tickets(&self, account_token: &str) -> Result<Value, ConnectorError> {
        let request = self.request(
            self.http.get(self.url("/api/ticketing/v1/tickets")),
            Some(account_token),
        )?;
        send_json(PROVIDER, request).await
    }

    /// Zendesk's own ticket listing via Merge passthrough.
    #[instrument(skip_all)]
    pub async fn get_tickets_raw(&self, account_token: &str) -> Result<Value, ConnectorError> {
        let request = self.request(
            self.http
                .post(self.url("/api/ticketing/v1/passthrough"))
                .json(&json!({ "method": "GET", "path": "/v2/tickets.json" })),
            Some(account_token),
        )?;
        send_json(PROVIDER, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_unified_key_is_not_configured() {
        let client = MergeUnifiedClient::new(Client::new(), MergeConfig::default());

        let err = client.get_tickets("acct").await.unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::NotConfigured {
                setting: "unified api key",
                ..
            }
        ));
    }
}
