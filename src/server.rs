//! # Server
//!
//! Router assembly, shared state and the serve loop.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::connectors::Providers;
use crate::crypto::CryptoKey;
use crate::handlers;
use crate::provisioning::Provisioning;
use crate::repositories::{IntegrationConnectionRepository, ProfileRepository};
use crate::telemetry::trace_id_middleware;
use crate::token_issuer::TokenIssuer;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub crypto_key: CryptoKey,
    pub providers: Providers,
    pub issuer: TokenIssuer,
}

impl AppState {
    /// Build state from configuration and an open pool.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        let key_bytes = config
            .crypto_key
            .clone()
            .ok_or_else(|| anyhow!("crypto key is not configured"))?;
        let crypto_key = CryptoKey::new(key_bytes).context("invalid crypto key")?;
        let providers = Providers::from_config(&config).context("failed to build HTTP client")?;
        let issuer = TokenIssuer::new(config.paragon.clone(), config.integration_app.clone());

        Ok(Self {
            config: Arc::new(config),
            db,
            crypto_key,
            providers,
            issuer,
        })
    }

    pub fn profiles(&self) -> ProfileRepository {
        ProfileRepository::new(Arc::new(self.db.clone()), self.crypto_key.clone())
    }

    pub fn connections(&self) -> IntegrationConnectionRepository {
        IntegrationConnectionRepository::new(Arc::new(self.db.clone()))
    }

    pub fn provisioning(&self) -> Provisioning {
        Provisioning::new(
            self.profiles(),
            self.connections(),
            self.issuer.clone(),
            self.providers.clone(),
            self.config.merge.default_connector.clone(),
        )
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/services", get(handlers::catalog::list_services))
        .route(
            "/profile",
            get(handlers::profile::get_profile).patch(handlers::profile::update_profile),
        )
        .route("/connections", get(handlers::connections::list_connections))
        .route(
            "/connections/{service}/{integration}",
            get(handlers::connections::get_connection)
                .put(handlers::connections::set_connection),
        )
        .route(
            "/connections/{service}/{integration}/toggle",
            post(handlers::connections::toggle_connection),
        )
        .route("/paragon/session", post(handlers::paragon::create_session))
        .route(
            "/paragon/shopify/proxy-get-products",
            get(handlers::paragon::shopify_proxy_get_products),
        )
        .route(
            "/paragon/shopify/actionkit-get-products",
            post(handlers::paragon::shopify_actionkit_get_products),
        )
        .route(
            "/paragon/magento/proxy-get-products",
            get(handlers::paragon::magento_proxy_get_products),
        )
        .route(
            "/paragon/magento/workflow-get-products",
            post(handlers::paragon::magento_workflow_get_products),
        )
        .route(
            "/paragon/magento/workflow-get-variants",
            post(handlers::paragon::magento_workflow_get_variants),
        )
        .route(
            "/integration-app/session",
            post(handlers::integration_app::create_session),
        )
        .route(
            "/integration-app/shopify/get-products",
            post(handlers::integration_app::shopify_get_products),
        )
        .route(
            "/integration-app/shopify/get-products-raw",
            post(handlers::integration_app::shopify_get_products_raw),
        )
        .route(
            "/integration-app/magento/get-products",
            post(handlers::integration_app::magento_get_products),
        )
        .route(
            "/integration-app/magento/get-products-raw",
            post(handlers::integration_app::magento_get_products_raw),
        )
        .route("/merge/session", post(handlers::merge::create_session))
        .route("/merge/link-token", post(handlers::merge::create_link_token))
        .route("/merge/exchange-token", post(handlers::merge::exchange_token))
        .route("/merge/tickets", get(handlers::merge::get_tickets))
        .route("/merge/tickets/raw", get(handlers::merge::get_tickets_raw))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id_middleware))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .with_context(|| format!("Invalid server address: {}", config.api_bind_addr))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::readyz,
        crate::handlers::catalog::list_services,
        crate::handlers::profile::get_profile,
        crate::handlers::profile::update_profile,
        crate::handlers::connections::list_connections,
        crate::handlers::connections::get_connection,
        crate::handlers::connections::set_connection,
        crate::handlers::connections::toggle_connection,
        crate::handlers::paragon::create_session,
        crate::handlers::paragon::shopify_proxy_get_products,
        crate::handlers::paragon::shopify_actionkit_get_products,
        crate::handlers::paragon::magento_proxy_get_products,
        crate::handlers::paragon::magento_workflow_get_products,
        crate::handlers::paragon::magento_workflow_get_variants,
        crate::handlers::integration_app::create_session,
        crate::handlers::integration_app::shopify_get_products,
        crate::handlers::integration_app::shopify_get_products_raw,
        crate::handlers::integration_app::magento_get_products,
        crate::handlers::integration_app::magento_get_products_raw,
        crate::handlers::merge::create_session,
        crate::handlers::merge::create_link_token,
        crate::handlers::merge::exchange_token,
        crate::handlers::merge::get_tickets,
        crate::handlers::merge::get_tickets_raw,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::error::ProviderError,
            crate::catalog::Service,
            crate::catalog::Integration,
            crate::catalog::CatalogEntry,
            crate::provisioning::MergeSession,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "iPaaS Dashboard API",
        description = "Provider sessions, proxied sample calls and connection state for the iPaaS dashboard",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
