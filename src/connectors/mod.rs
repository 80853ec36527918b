//! Provider clients
//!
//! Thin wrappers over each iPaaS vendor's hosted API. All of them share one
//! `reqwest::Client` and the request/error handling in [`http`].

pub mod http;
pub mod integration_app;
pub mod merge_handler;
pub mod merge_unified;
pub mod paragon;

use std::time::Duration;

pub use http::{ConnectorError, build_client};
pub use integration_app::IntegrationAppClient;
pub use merge_handler::MergeHandlerClient;
pub use merge_unified::MergeUnifiedClient;
pub use paragon::ParagonClient;

use crate::config::AppConfig;

/// Every provider client, built from configuration.
#[derive(Debug, Clone)]
pub struct Providers {
    pub paragon: ParagonClient,
    pub integration_app: IntegrationAppClient,
    pub merge_handler: MergeHandlerClient,
    pub merge_unified: MergeUnifiedClient,
}

impl Providers {
    pub fn from_config(config: &AppConfig) -> reqwest::Result<Self> {
        let http = build_client(Duration::from_millis(config.http_timeout_ms))?;

        Ok(Self {
            paragon: ParagonClient::new(http.clone(), config.paragon.clone()),
            integration_app: IntegrationAppClient::new(
                http.clone(),
                config.integration_app.clone(),
            ),
            merge_handler: MergeHandlerClient::new(http.clone(), config.merge.clone()),
            merge_unified: MergeUnifiedClient::new(http, config.merge.clone()),
        })
    }
}
