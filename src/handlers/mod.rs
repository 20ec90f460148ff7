//! # API Handlers
//!
//! HTTP endpoint handlers for the organization registry.

pub mod admin;
pub mod organizations;

use axum::{extract::State, http::StatusCode, response::Json};

use crate::db;
use crate::error::{ApiError, ErrorType};
use crate::models::ServiceInfo;
use crate::server::AppState;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Readiness check: both stores answer a trivial query
#[utoipa::path(
    get,
    path = "/readyz",
    responses(
        (status = 200, description = "Catalog and tenant stores reachable"),
        (status = 503, description = "A store is unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn readyz(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    for (store, conn) in [("catalog", &state.pools.catalog), ("tenants", &state.pools.tenants)] {
        if let Err(e) = db::health_check(conn).await {
            tracing::warn!(store, error = %e, "Readiness check failed");
            return Err(ErrorType::ServiceUnavailable.into());
        }
    }
    Ok(StatusCode::OK)
}
