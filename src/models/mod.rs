//! # Data Models
//!
//! SeaORM entities for the dashboard's two durable tables.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod integration_connection;
pub mod profile;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "ipaas-dashboard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
