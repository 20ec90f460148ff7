//! # Admin API Handlers

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@techcorp.com")]
    pub email: String,
    #[schema(example = "SecurePass123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Signed access token
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
    pub admin_email: String,
    pub org_name: String,
}

/// Exchange admin credentials for an access token
#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 400, description = "Malformed request", body = ApiError),
        (status = 401, description = "Incorrect email or password", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    let session = state
        .registry
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        access_token: session.access_token,
        token_type: session.token_type,
        admin_email: session.admin_email,
        org_name: session.organization_name,
    }))
}
