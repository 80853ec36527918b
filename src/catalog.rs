//! Services, integrations and which combinations the dashboard offers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// iPaaS vendor brokering a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Service {
    Paragon,
    Merge,
    IntegrationApp,
}

/// Third-party business system reached through a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Integration {
    Shopify,
    Magento,
    Zendesk,
    Hubspot,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown service '{0}'")]
    UnknownService(String),
    #[error("unknown integration '{0}'")]
    UnknownIntegration(String),
}

impl Service {
    pub const ALL: [Service; 3] = [Service::Paragon, Service::Merge, Service::IntegrationApp];

    pub fn parse(slug: &str) -> Result<Self, CatalogError> {
        match slug.trim().to_ascii_lowercase().as_str() {
            "paragon" => Ok(Service::Paragon),
            "merge" => Ok(Service::Merge),
            "integration-app" => Ok(Service::IntegrationApp),
            _ => Err(CatalogError::UnknownService(slug.to_string())),
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Service::Paragon => "paragon",
            Service::Merge => "merge",
            Service::IntegrationApp => "integration-app",
        }
    }

    /// Name persisted in the connections table.
    pub fn display_name(&self) -> &'static str {
        match self {
            Service::Paragon => "Paragon",
            Service::Merge => "Merge",
            Service::IntegrationApp => "Integration App",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.display_name() == name)
    }
}

impl Integration {
    pub const ALL: [Integration; 4] = [
        Integration::Shopify,
        Integration::Magento,
        Integration::Zendesk,
        Integration::Hubspot,
    ];

    pub fn parse(slug: &str) -> Result<Self, CatalogError> {
        match slug.trim().to_ascii_lowercase().as_str() {
            "shopify" => Ok(Integration::Shopify),
            "magento" => Ok(Integration::Magento),
            "zendesk" => Ok(Integration::Zendesk),
            "hubspot" => Ok(Integration::Hubspot),
            _ => Err(CatalogError::UnknownIntegration(slug.to_string())),
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Integration::Shopify => "shopify",
            Integration::Magento => "magento",
            Integration::Zendesk => "zendesk",
            Integration::Hubspot => "hubspot",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Integration::Shopify => "Shopify",
            Integration::Magento => "Magento",
            Integration::Zendesk => "Zendesk",
            Integration::Hubspot => "Hubspot",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.display_name() == name)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Whether the dashboard offers `integration` through `service`.
///
/// Unavailable pairs are shown as "coming soon" and cannot be toggled.
pub fn is_available(service: Service, integration: Integration) -> bool {
    use Integration::*;

    match service {
        Service::Paragon | Service::IntegrationApp => matches!(integration, Shopify | Magento),
        Service::Merge => matches!(integration, Shopify | Zendesk),
    }
}

/// One cell of the service/integration matrix.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogEntry {
    pub service: Service,
    pub service_name: String,
    pub integration: Integration,
    pub integration_name: String,
    pub available: bool,
}

/// The full matrix, services in display order.
pub fn catalog() -> Vec<CatalogEntry> {
    Service::ALL
        .into_iter()
        .flat_map(|service| {
            Integration::ALL.into_iter().map(move |integration| CatalogEntry {
                service,
                service_name: service.display_name().to_string(),
                integration,
                integration_name: integration.display_name().to_string(),
                available: is_available(service, integration),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Service::parse("Integration-App"), Ok(Service::IntegrationApp));
        assert_eq!(Integration::parse("SHOPIFY"), Ok(Integration::Shopify));
    }

    #[test]
    fn parse_rejects_unknown_slugs() {
        assert_eq!(
            Service::parse("zapier"),
            Err(CatalogError::UnknownService("zapier".to_string()))
        );
        assert!(Integration::parse("salesforce").is_err());
    }

    #[test]
    fn display_names_round_trip() {
        for service in Service::ALL {
            assert_eq!(Service::from_display_name(service.display_name()), Some(service));
        }
        assert_eq!(Service::IntegrationApp.display_name(), "Integration App");
        assert_eq!(Integration::from_display_name("Hubspot"), Some(Integration::Hubspot));
    }

    #[test]
    fn availability_matrix() {
        assert!(is_available(Service::Paragon, Integration::Magento));
        assert!(!is_available(Service::Paragon, Integration::Zendesk));
        assert!(is_available(Service::IntegrationApp, Integration::Shopify));
        assert!(!is_available(Service::IntegrationApp, Integration::Hubspot));
        assert!(is_available(Service::Merge, Integration::Zendesk));
        assert!(is_available(Service::Merge, Integration::Shopify));
        assert!(!is_available(Service::Merge, Integration::Magento));
        assert!(!is_available(Service::Merge, Integration::Hubspot));
    }

    #[test]
    fn catalog_covers_every_pair() {
        let entries = catalog();
        assert_eq!(entries.len(), 12);
        assert_eq!(entries.iter().filter(|e| e.available).count(), 6);
        assert_eq!(entries[0].service_name, "Paragon");
    }

    #[test]
    fn wire_slugs_match_serde() {
        let json = serde_json::to_string(&Service::IntegrationApp).unwrap();
        assert_eq!(json, "\"integration-app\"");
        let json = serde_json::to_string(&Integration::Zendesk).unwrap();
        assert_eq!(json, "\"zendesk\"");
    }
}
