//! Paragon proxy, ActionKit and workflow trigger calls.
//!
//! Every call is authorized with the user's Paragon token, the RS256 JWT
//! minted by [`crate::token_issuer::TokenIssuer::sign_paragon_token`].

use reqwest::Client;
use serde_json::{Value, json};
use tracing::instrument;

use super::http::{ConnectorError, authorize, endpoint, send_json};
use crate::config::ParagonConfig;

const PROVIDER: &str = "paragon";
const SHOPIFY_ADMIN_API_VERSION: &str = "2025-10";

#[derive(Debug, Clone)]
pub struct ParagonClient {
    http: Client,
    config: ParagonConfig,
}

impl ParagonClient {
    pub fn new(http: Client, config: ParagonConfig) -> Self {
        Self { http, config }
    }

    fn project_id(&self) -> Result<&str, ConnectorError> {
        self.config
            .project_id
            .as_deref()
            .ok_or(ConnectorError::NotConfigured {
                provider: PROVIDER,
                setting: "project id",
            })
    }

    fn magento_integration_id(&self) -> Result<&str, ConnectorError> {
        self.config
            .magento_integration_id
            .as_deref()
            .ok_or(ConnectorError::NotConfigured {
                provider: PROVIDER,
                setting: "magento integration id",
            })
    }

    /// List Shopify products through the Paragon proxy.
    #[instrument(skip_all)]
    pub async fn shopify_proxy_get_products(&self, token: &str) -> Result<Value, ConnectorError> {
        let url = endpoint(
            &self.config.proxy_base,
            &format!(
                "/projects/{}/sdk/proxy/shopify/admin/api/{}/products.json",
                self.project_id()?,
                SHOPIFY_ADMIN_API_VERSION
            ),
        );
        send_json(PROVIDER, authorize(self.http.get(url), token)).await
    }

    /// Run the `SHOPIFY_GET_PRODUCTS` ActionKit action.
    #[instrument(skip_all)]
    pub async fn shopify_actionkit_get_products(
        &self,
        token: &str,
        product_ids: &str,
    ) -> Result<Value, ConnectorError> {
        let url = endpoint(
            &self.config.actionkit_base,
            &format!("/projects/{}/actions/", self.project_id()?),
        );
        let body = json!({
            "action": "SHOPIFY_GET_PRODUCTS",
            "parameters": { "productIds": product_ids },
        });
        send_json(PROVIDER, authorize(self.http.post(url), token).json(&body)).await
    }

    /// First page (20 items) of Magento products through the custom integration proxy.
    #[instrument(skip_all)]
    pub async fn magento_proxy_get_products(&self, token: &str) -> Result<Value, ConnectorError> {
        let url = endpoint(
            &self.config.proxy_base,
            &format!(
                "/projects/{}/sdk/proxy/custom/{}/rest/V1/products?searchCriteria[pageSize]=20&searchCriteria[currentPage]=1",
                self.project_id()?,
                self.magento_integration_id()?
            ),
        );
        send_json(PROVIDER, authorize(self.http.get(url), token)).await
    }

    #[instrument(skip_all)]
    pub async fn magento_workflow_get_products(
        &self,
        token: &str,
    ) -> Result<Value, ConnectorError> {
        let url = self.trigger_url(&self.config.magento_products_workflow_id)?;
        send_json(PROVIDER, authorize(self.http.post(url), token).json(&json!({}))).await
    }

    #[instrument(skip_all, fields(sku = %sku))]
    pub async fn magento_workflow_get_variants(
        &self,
        token: &str,
        sku: &str,
    ) -> Result<Value, ConnectorError> {
        let url = self.trigger_url(&self.config.magento_variants_workflow_id)?;
        let request = authorize(self.http.post(url), token)
            .query(&[("sku", sku)])
            .json(&json!({}));
        send_json(PROVIDER, request).await
    }

    fn trigger_url(&self, workflow_id: &str) -> Result<String, ConnectorError> {
        Ok(endpoint(
            &self.config.zeus_base,
            &format!("/projects/{}/sdk/triggers/{}", self.project_id()?, workflow_id),
        ))
    }
}
