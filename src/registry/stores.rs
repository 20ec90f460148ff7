//! Store seams used by the registry.
//!
//! The registry never opens connections itself. The composition root hands it
//! a catalog store and a partition store; tests substitute fault-injecting
//! implementations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::PartitionState;
use crate::models::organization::Model as OrganizationRecord;

/// Field used to locate a single catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFilter<'a> {
    /// Exact, case-sensitive organization name.
    OrganizationName(&'a str),
    /// Case-folded name key.
    NameKey(&'a str),
    /// Admin email; the oldest matching record wins.
    Email(&'a str),
}

/// Catalog record to insert. Storage assigns the id and timestamps; the
/// partition state starts as [`PartitionState::Pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganizationRecord {
    pub organization_name: String,
    pub name_key: String,
    pub email: String,
    pub admin_password_hash: String,
    pub partition_name: String,
    pub admin_id: String,
}

/// Field-level changes to a catalog record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub email: Option<String>,
    pub admin_password_hash: Option<String>,
    pub partition_state: Option<PartitionState>,
}

impl RecordPatch {
    pub fn partition_state(state: PartitionState) -> Self {
        Self {
            partition_state: Some(state),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.admin_password_hash.is_none() && self.partition_state.is_none()
    }
}

/// Master catalog of organizations.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_one(
        &self,
        filter: CatalogFilter<'_>,
    ) -> Result<Option<OrganizationRecord>, RepositoryError>;

    /// Insert a record. A duplicate name or name key yields
    /// [`RepositoryError::Conflict`].
    async fn insert_one(&self, record: NewOrganizationRecord) -> Result<Uuid, RepositoryError>;

    async fn update_one(
        &self,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<OrganizationRecord, RepositoryError>;

    async fn delete_one(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Records whose partition is not [`PartitionState::Ready`], oldest first.
    async fn find_unprovisioned(&self) -> Result<Vec<OrganizationRecord>, RepositoryError>;
}

/// Tenant partition store: one named collection per organization.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Create the partition and insert `seed` into it as one unit. Fails if
    /// the partition already exists.
    async fn create_and_seed(
        &self,
        partition_name: &str,
        seed: serde_json::Value,
    ) -> Result<(), RepositoryError>;

    /// Drop the partition. Dropping a missing partition succeeds.
    async fn drop_partition(&self, partition_name: &str) -> Result<(), RepositoryError>;

    async fn exists(&self, partition_name: &str) -> Result<bool, RepositoryError>;
}
