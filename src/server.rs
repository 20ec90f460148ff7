//! # Server Configuration
//!
//! Composition root: opens the store pools, wires the registry to its store
//! and credential services, and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::credentials::{Argon2JwtCredentials, CredentialError};
use crate::db::{self, StorePools};
use crate::handlers::{self, admin, organizations};
use crate::registry::OrganizationRegistry;
use crate::repositories::{OrganizationRepository, SqlPartitionStore};
use crate::telemetry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<OrganizationRegistry>,
    pub pools: StorePools,
}

/// Builds the registry over the given pools.
pub fn build_state(config: AppConfig, pools: StorePools) -> Result<AppState, CredentialError> {
    let credentials = Arc::new(Argon2JwtCredentials::from_config(&config)?);
    let catalog = Arc::new(OrganizationRepository::new(Arc::new(pools.catalog.clone())));
    let partitions = Arc::new(SqlPartitionStore::new(Arc::new(pools.tenants.clone())));

    Ok(AppState {
        config: Arc::new(config),
        registry: Arc::new(OrganizationRegistry::new(catalog, partitions, credentials)),
        pools,
    })
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/readyz", get(handlers::readyz))
        .route("/org/create", post(organizations::create_organization))
        .route("/org/get", get(organizations::get_organization))
        .route("/org/update", put(organizations::update_organization))
        .route("/org/delete", delete(organizations::delete_organization))
        .route("/org/unprovisioned", get(organizations::list_unprovisioned))
        .route("/org/reconcile", post(organizations::reconcile_organization))
        .route("/admin/login", post(admin::login))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(telemetry::trace_context_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Opens the stores, applies migrations and serves until Ctrl-C.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr().context("invalid server address")?;

    let pools = db::init_pools(&config).await?;
    db::run_migrations(&pools.catalog).await?;

    let profile = config.profile.clone();
    let state = build_state(config, pools).context("failed to build credential service")?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::readyz,
        crate::handlers::organizations::create_organization,
        crate::handlers::organizations::get_organization,
        crate::handlers::organizations::update_organization,
        crate::handlers::organizations::delete_organization,
        crate::handlers::organizations::list_unprovisioned,
        crate::handlers::organizations::reconcile_organization,
        crate::handlers::admin::login,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::PartitionState,
            crate::error::ApiError,
            crate::registry::OrganizationView,
            crate::registry::ProvisioningStatus,
            crate::handlers::organizations::CreateOrganizationRequest,
            crate::handlers::organizations::UpdateOrganizationRequest,
            crate::handlers::organizations::DeleteOrganizationResponse,
            crate::handlers::admin::LoginRequest,
            crate::handlers::admin::LoginResponse,
        )
    ),
    tags(
        (name = "organizations", description = "Organization lifecycle"),
        (name = "admin", description = "Admin authentication"),
    ),
    info(
        title = "Organization Registry API",
        description = "Multi-tenant organization registry with per-organization data partitions",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
