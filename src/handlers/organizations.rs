//! # Organization API Handlers
//!
//! CRUD endpoints over the organization registry plus the provisioning
//! maintenance endpoints.

use axum::{
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::registry::{
    NewOrganization, OrganizationPatch, OrganizationView, ProvisioningStatus, RegistryError,
};
use crate::server::AppState;

/// Request payload for creating an organization
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOrganizationRequest {
    /// Unique organization name (letters, digits, `_` and `-`; at most 59 characters)
    #[schema(example = "TechCorp")]
    pub organization_name: String,
    /// Admin email, also used to log in
    #[schema(example = "admin@techcorp.com")]
    pub email: String,
    /// Admin password
    #[schema(example = "SecurePass123")]
    pub password: String,
}

/// Request payload for updating an organization
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrganizationRequest {
    /// Name of the organization to update
    #[schema(example = "TechCorp")]
    pub organization_name: Option<String>,
    /// New admin email; empty or absent leaves it unchanged
    pub email: Option<String>,
    /// New admin password; empty or absent leaves it unchanged
    pub password: Option<String>,
}

/// Query string identifying an organization
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrganizationQuery {
    /// Exact organization name
    pub organization_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteOrganizationResponse {
    #[schema(example = "success")]
    pub status: String,
    #[schema(example = "Organization deleted")]
    pub message: String,
    /// Whether the tenant partition was dropped
    pub partition_dropped: bool,
}

/// Create a new organization
#[utoipa::path(
    post,
    path = "/org/create",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 200, description = "Organization created", body = OrganizationView),
        (status = 400, description = "Validation failed or organization exists", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "organizations"
)]
pub async fn create_organization(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> Result<Json<OrganizationView>, ApiError> {
    let Json(request) = payload?;

    let view = state
        .registry
        .create_organization(NewOrganization {
            organization_name: request.organization_name,
            email: request.email,
            password: request.password,
        })
        .await?;

    Ok(Json(view))
}

/// Get an organization by name
#[utoipa::path(
    get,
    path = "/org/get",
    params(OrganizationQuery),
    responses(
        (status = 200, description = "Organization found", body = OrganizationView),
        (status = 400, description = "Missing organization name", body = ApiError),
        (status = 404, description = "Organization not found", body = ApiError)
    ),
    tag = "organizations"
)]
pub async fn get_organization(
    State(state): State<AppState>,
    query: Result<Query<OrganizationQuery>, QueryRejection>,
) -> Result<Json<OrganizationView>, ApiError> {
    let Query(query) = query?;
    let view = state
        .registry
        .get_organization(&query.organization_name)
        .await?;
    Ok(Json(view))
}

/// Update an organization's admin email and/or password
#[utoipa::path(
    put,
    path = "/org/update",
    request_body = UpdateOrganizationRequest,
    responses(
        (status = 200, description = "Organization updated", body = OrganizationView),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Organization not found", body = ApiError)
    ),
    tag = "organizations"
)]
pub async fn update_organization(
    State(state): State<AppState>,
    payload: Result<Json<UpdateOrganizationRequest>, JsonRejection>,
) -> Result<Json<OrganizationView>, ApiError> {
    let Json(request) = payload?;

    let organization_name = request
        .organization_name
        .filter(|name| !name.is_empty())
        .ok_or(RegistryError::Validation {
            field: "organization_name".to_string(),
            message: "Organization name required to identify organization".to_string(),
        })?;

    let patch = OrganizationPatch::from_optional_fields(request.email, request.password);
    let view = state
        .registry
        .update_organization(&organization_name, patch)
        .await?;

    Ok(Json(view))
}

/// Delete an organization and drop its partition
#[utoipa::path(
    delete,
    path = "/org/delete",
    params(OrganizationQuery),
    responses(
        (status = 200, description = "Organization deleted", body = DeleteOrganizationResponse),
        (status = 400, description = "Missing organization name", body = ApiError),
        (status = 404, description = "Organization not found", body = ApiError)
    ),
    tag = "organizations"
)]
pub async fn delete_organization(
    State(state): State<AppState>,
    query: Result<Query<OrganizationQuery>, QueryRejection>,
) -> Result<Json<DeleteOrganizationResponse>, ApiError> {
    let Query(query) = query?;
    let report = state
        .registry
        .delete_organization(&query.organization_name)
        .await?;

    let message = if report.partition_dropped() {
        format!("Organization {} deleted", report.organization_name)
    } else {
        format!(
            "Organization {} deleted; partition {} could not be dropped",
            report.organization_name, report.partition_name
        )
    };

    Ok(Json(DeleteOrganizationResponse {
        status: "success".to_string(),
        message,
        partition_dropped: report.partition_dropped(),
    }))
}

/// List organizations whose partition is not provisioned
#[utoipa::path(
    get,
    path = "/org/unprovisioned",
    responses(
        (status = 200, description = "Organizations awaiting provisioning", body = [ProvisioningStatus]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "organizations"
)]
pub async fn list_unprovisioned(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProvisioningStatus>>, ApiError> {
    Ok(Json(state.registry.list_unprovisioned().await?))
}

/// Provision a missing or failed partition
#[utoipa::path(
    post,
    path = "/org/reconcile",
    params(OrganizationQuery),
    responses(
        (status = 200, description = "Partition ready", body = ProvisioningStatus),
        (status = 404, description = "Organization not found", body = ApiError),
        (status = 500, description = "Partition could not be provisioned", body = ApiError)
    ),
    tag = "organizations"
)]
pub async fn reconcile_organization(
    State(state): State<AppState>,
    query: Result<Query<OrganizationQuery>, QueryRejection>,
) -> Result<Json<ProvisioningStatus>, ApiError> {
    let Query(query) = query?;
    let status = state
        .registry
        .reconcile_organization(&query.organization_name)
        .await?;
    Ok(Json(status))
}
