//! # Error Handling
//!
//! Unified error handling for the organization registry: a problem+json
//! response type for the HTTP surface, the repository error shared by the
//! store adapters, and the mapping from registry failures to responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::registry::RegistryError;
use crate::telemetry;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Extract current trace ID from the request scope (falls back to a generated correlation ID)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

/// Errors raised by the SeaORM-backed store adapters.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(sea_orm::DbErr),
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl RepositoryError {
    /// Wrap a SeaORM error, singling out unique-constraint violations.
    pub fn database_error(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return RepositoryError::Conflict(error.to_string());
        }
        RepositoryError::Database(error)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        RepositoryError::Validation(message.into())
    }
}

fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const MYSQL_DUPLICATE_CODES: &[&str] = &["1022", "1062", "1169", "1586"];
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    if let Some(code) = db_error.code() {
        let code_str = code.as_ref();
        if code_str == PG_UNIQUE
            || MYSQL_DUPLICATE_CODES.contains(&code_str)
            || SQLITE_DUPLICATE_CODES.contains(&code_str)
        {
            return true;
        }
    }

    false
}

/// Standard error types with predefined status codes
#[derive(Debug, Error)]
pub enum ErrorType {
    #[error("Internal Server Error")]
    InternalServerError,
    #[error("Service Unavailable")]
    ServiceUnavailable,
}

impl ErrorType {
    /// Get the appropriate HTTP status code for this error type
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorType::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code string for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorType::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorType::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        (self.status, headers, axum::Json(self)).into_response()
    }
}

impl From<ErrorType> for ApiError {
    fn from(error_type: ErrorType) -> Self {
        Self::new(
            error_type.status_code(),
            error_type.error_code(),
            &error_type.to_string(),
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            &format!("Invalid query string: {}", rejection.body_text()),
        )
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        match error {
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                ErrorType::ServiceUnavailable.into()
            }
            _ => {
                tracing::error!("Database error: {:?}", error);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::Validation { field, message } => {
                validation_error(&message, serde_json::json!({ field: message.clone() }))
            }
            // Duplicate organizations are a 400 for existing clients of the create endpoint.
            RegistryError::Conflict(name) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "ORGANIZATION_EXISTS",
                "Organization already exists",
            )
            .with_details(serde_json::json!({ "organization_name": name })),
            RegistryError::NotFound(name) => ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Organization not found",
            )
            .with_details(serde_json::json!({ "organization_name": name })),
            RegistryError::InvalidCredentials => unauthorized(Some("Incorrect email or password")),
            RegistryError::Catalog(RepositoryError::Database(db_err)) => db_err.into(),
            other => {
                tracing::error!(error = %other, "Registry operation failed");
                ErrorType::InternalServerError.into()
            }
        }
    }
}

/// Create an unauthorized error (401)
pub fn unauthorized(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Authentication required");
    ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_basic() {
        let error = ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Test error message",
        );

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error message"));
        assert_eq!(error.details, None);
    }

    #[test]
    fn test_error_type_mapping() {
        let unavailable: ApiError = ErrorType::ServiceUnavailable.into();
        assert_eq!(unavailable.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.code, Box::from("SERVICE_UNAVAILABLE"));
        assert_eq!(unavailable.message, Box::from("Service Unavailable"));
    }

    #[test]
    fn test_content_type_header() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error");

        let response = error.into_response();

        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_trace_id_generation() {
        let error = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Test error",
        );

        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13);
    }

    #[test]
    fn test_conflict_maps_to_bad_request() {
        let api_error: ApiError = RegistryError::Conflict("TechCorp".to_string()).into();

        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, Box::from("ORGANIZATION_EXISTS"));
        assert_eq!(
            api_error.details,
            Some(Box::new(json!({ "organization_name": "TechCorp" })))
        );
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let api_error: ApiError = RegistryError::NotFound("Ghost".to_string()).into();

        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, Box::from("NOT_FOUND"));
    }

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        let api_error: ApiError = RegistryError::InvalidCredentials.into();

        assert_eq!(api_error.status, StatusCode::UNAUTHORIZED);
        assert_eq!(api_error.message, Box::from("Incorrect email or password"));
    }

    #[test]
    fn test_validation_error_names_field() {
        let api_error: ApiError = RegistryError::Validation {
            field: "email".to_string(),
            message: "email must be a valid address".to_string(),
        }
        .into();

        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(
            api_error.details,
            Some(Box::new(json!({ "email": "email must be a valid address" })))
        );
    }

    #[test]
    fn test_partition_failure_is_generic_500() {
        let api_error: ApiError = RegistryError::PartitionProvisioning {
            partition_name: "org_TechCorp".to_string(),
            source: RepositoryError::validation_error("disk full"),
        }
        .into();

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code, Box::from("INTERNAL_SERVER_ERROR"));
        assert!(!api_error.message.contains("org_TechCorp"));
    }

    #[test]
    fn test_connection_errors_map_to_unavailable() {
        let api_error: ApiError =
            sea_orm::DbErr::Conn(sea_orm::RuntimeErr::Internal("refused".to_string())).into();

        assert_eq!(api_error.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_catalog_connection_loss_maps_to_unavailable() {
        let api_error: ApiError = RegistryError::Catalog(RepositoryError::Database(
            sea_orm::DbErr::Conn(sea_orm::RuntimeErr::Internal("refused".to_string())),
        ))
        .into();

        assert_eq!(api_error.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_error.code, Box::from("SERVICE_UNAVAILABLE"));
    }

    #[test]
    fn test_catalog_query_errors_stay_generic() {
        let api_error: ApiError = RegistryError::Catalog(RepositoryError::Database(
            sea_orm::DbErr::Custom("syntax error near org_TechCorp".to_string()),
        ))
        .into();

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_error.message.contains("org_TechCorp"));
    }
}
