//! Shared outbound request handling for the provider clients.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by provider clients.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("{provider} is not configured: missing {setting}")]
    NotConfigured {
        provider: &'static str,
        setting: &'static str,
    },

    #[error("{provider} request failed: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}")]
    Upstream {
        provider: &'static str,
        status: u16,
        body: Value,
    },

    #[error("{provider} returned an unreadable response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },
}

/// Build the HTTP client shared by every provider.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("ipaas-dashboard/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Attach bearer auth and a JSON content type.
pub(crate) fn authorize(request: RequestBuilder, token: &str) -> RequestBuilder {
    request
        .bearer_auth(token)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
}

/// Send a request and return its JSON body.
///
/// Non-2xx responses become [`ConnectorError::Upstream`] carrying the parsed
/// body, or the raw text when the body is not JSON.
pub(crate) async fn send_json(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<Value, ConnectorError> {
    let response = request
        .send()
        .await
        .map_err(|source| ConnectorError::Network { provider, source })?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|source| ConnectorError::Network { provider, source })?;

    if !status.is_success() {
        warn!(provider, status = status.as_u16(), "provider returned an error");
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        return Err(ConnectorError::Upstream {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    debug!(provider, status = status.as_u16(), "provider call succeeded");

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| ConnectorError::InvalidResponse {
        provider,
        message: e.to_string(),
    })
}

/// Extract a required string field from a provider response.
pub(crate) fn require_str(
    provider: &'static str,
    body: &Value,
    field: &str,
) -> Result<String, ConnectorError> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConnectorError::InvalidResponse {
            provider,
            message: format!("missing '{}' in response", field),
        })
}
