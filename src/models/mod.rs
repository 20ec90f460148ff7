//! # Data Models
//!
//! SeaORM entities and shared response types for the organization registry.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod organization;

pub use organization::Entity as Organization;
pub use organization::PartitionState;

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
            service: "org-registry".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
