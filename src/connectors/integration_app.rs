//! Integration App action runs and data source listings.

use reqwest::Client;
use serde_json::{Map, Value};
use tracing::instrument;

use super::http::{ConnectorError, authorize, endpoint, send_json};
use crate::config::IntegrationAppConfig;

const PROVIDER: &str = "integration-app";

#[derive(Debug, Clone)]
pub struct IntegrationAppClient {
    http: Client,
    config: IntegrationAppConfig,
}

impl IntegrationAppClient {
    pub fn new(http: Client, config: IntegrationAppConfig) -> Self {
        Self { http, config }
    }

    #[instrument(skip_all)]
    pub async fn shopify_get_products(
        &self,
        token: &str,
        cursor: Option<&str>,
    ) -> Result<Value, ConnectorError> {
        self.run_action("shopify", "get-products", cursor, token).await
    }

    #[instrument(skip_all)]
    pub async fn shopify_get_products_raw(&self, token: &str) -> Result<Value, ConnectorError> {
        self.list_collection(&self.config.shopify_products_source_id, token)
            .await
    }

    /// Magento is exposed by Integration App as the `adobe-commerce` connector.
    #[instrument(skip_all)]
    pub async fn magento_get_products(
        &self,
        token: &str,
        cursor: Option<&str>,
    ) -> Result<Value, ConnectorError> {
        self.run_action("adobe-commerce", "get-products", cursor, token)
            .await
    }

    #[instrument(skip_all)]
    pub async fn magento_get_products_raw(&self, token: &str) -> Result<Value, ConnectorError> {
        self.list_collection(&self.config.magento_products_source_id, token)
            .await
    }

    async fn run_action(
        &self,
        connector: &str,
        action: &str,
        cursor: Option<&str>,
        token: &str,
    ) -> Result<Value, ConnectorError> {
        let url = endpoint(
            &self.config.api_base,
            &format!("/connections/{}/actions/{}/run", connector, action),
        );
        let request = authorize(self.http.post(url), token).json(&cursor_body(cursor));
        send_json(PROVIDER, request).await
    }

    async fn list_collection(
        &self,
        source_instance_id: &str,
        token: &str,
    ) -> Result<Value, ConnectorError> {
        let url = endpoint(
            &self.config.api_base,
            &format!(
                "/data-source-instances/{}/collection/list",
                source_instance_id
            ),
        );
        send_json(PROVIDER, authorize(self.http.post(url), token)).await
    }
}

/// `{"cursor": ...}`, or `{}` when there is no cursor.
fn cursor_body(cursor: Option<&str>) -> Value {
    let mut body = Map::new();
    if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        body.insert("cursor".to_string(), Value::String(cursor.to_string()));
    }
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_cursor_is_omitted() {
        assert_eq!(cursor_body(None), json!({}));
        assert_eq!(cursor_body(Some("")), json!({}));
        assert_eq!(cursor_body(Some("page-2")), json!({"cursor": "page-2"}));
    }
}
