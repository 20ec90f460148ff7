//! # Organization Registry
//!
//! Lifecycle of organizations across two stores: the master catalog holding
//! one record per organization, and the tenant partition store holding one
//! partition per organization.
//!
//! The stores share no transaction. Create writes the catalog record first
//! and tracks partition provisioning in [`PartitionState`]; delete drops the
//! partition on a best-effort basis and always removes the catalog record.

pub mod naming;
pub mod stores;


use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::credentials::{CredentialError, CredentialService};
use crate::error::RepositoryError;
use crate::models::PartitionState;
use crate::models::organization::Model as OrganizationRecord;

pub use stores::{CatalogFilter, CatalogStore, NewOrganizationRecord, PartitionStore, RecordPatch};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("organization '{0}' already exists")]
    Conflict(String),
    #[error("organization '{0}' not found")]
    NotFound(String),
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("failed to provision partition '{partition_name}': {source}")]
    PartitionProvisioning {
        partition_name: String,
        source: RepositoryError,
    },
    #[error("catalog store error: {0}")]
    Catalog(#[source] RepositoryError),
    #[error("credential service error: {0}")]
    Credentials(#[from] CredentialError),
}

impl RegistryError {
    fn validation(field: &str, message: impl Into<String>) -> Self {
        RegistryError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Input for [`OrganizationRegistry::create_organization`].
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub organization_name: String,
    pub email: String,
    pub password: String,
}

/// Changes accepted by [`OrganizationRegistry::update_organization`].
///
/// The organization name is immutable; only contact and credentials change.
#[derive(Debug, Clone, Default)]
pub struct OrganizationPatch {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl OrganizationPatch {
    /// Build a patch where empty strings count as "not provided".
    pub fn from_optional_fields(email: Option<String>, password: Option<String>) -> Self {
        Self {
            email: email.filter(|value| !value.is_empty()),
            password: password.filter(|value| !value.is_empty()),
        }
    }
}

/// Public projection of a catalog record. Never carries the password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrganizationView {
    pub organization_name: String,
    pub email: String,
    pub partition_name: String,
    pub admin_id: String,
}

impl From<&OrganizationRecord> for OrganizationView {
    fn from(record: &OrganizationRecord) -> Self {
        Self {
            organization_name: record.organization_name.clone(),
            email: record.email.clone(),
            partition_name: record.partition_name.clone(),
            admin_id: record.admin_id.clone(),
        }
    }
}

/// Outcome of the partition half of a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionTeardown {
    Dropped,
    /// Drop failed; the partition may still exist without a catalog record.
    Orphaned { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub organization_name: String,
    pub partition_name: String,
    pub partition: PartitionTeardown,
}

impl DeletionReport {
    pub fn partition_dropped(&self) -> bool {
        self.partition == PartitionTeardown::Dropped
    }
}

/// Partition provisioning status of one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProvisioningStatus {
    pub organization_name: String,
    pub partition_name: String,
    pub partition_state: PartitionState,
}

impl From<&OrganizationRecord> for ProvisioningStatus {
    fn from(record: &OrganizationRecord) -> Self {
        Self {
            organization_name: record.organization_name.clone(),
            partition_name: record.partition_name.clone(),
            partition_state: record.partition_state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    pub access_token: String,
    pub token_type: String,
    pub admin_email: String,
    pub organization_name: String,
}

/// First document written into every new partition.
pub fn init_marker() -> serde_json::Value {
    serde_json::json!({ "type": "init", "info": "Organization Created" })
}

/// Organization lifecycle over injected catalog, partition and credential services.
#[derive(Clone)]
pub struct OrganizationRegistry {
    catalog: Arc<dyn CatalogStore>,
    partitions: Arc<dyn PartitionStore>,
    credentials: Arc<dyn CredentialService>,
}

impl OrganizationRegistry {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        partitions: Arc<dyn PartitionStore>,
        credentials: Arc<dyn CredentialService>,
    ) -> Self {
        Self {
            catalog,
            partitions,
            credentials,
        }
    }

    /// Register an organization and provision its partition.
    ///
    /// The catalog record is written before the partition. If provisioning
    /// fails the record stays, marked [`PartitionState::Failed`], and the call
    /// returns [`RegistryError::PartitionProvisioning`].
    pub async fn create_organization(
        &self,
        request: NewOrganization,
    ) -> Result<OrganizationView, RegistryError> {
        let NewOrganization {
            organization_name,
            email,
            password,
        } = request;

        validate_name(&organization_name)?;
        validate_email(&email)?;
        if password.is_empty() {
            return Err(RegistryError::validation("password", "password cannot be empty"));
        }

        let name_key = naming::name_key(&organization_name);
        if self
            .catalog
            .find_one(CatalogFilter::NameKey(&name_key))
            .await
            .map_err(RegistryError::Catalog)?
            .is_some()
        {
            return Err(RegistryError::Conflict(organization_name));
        }

        let partition_name = naming::partition_name(&organization_name);
        let admin_id = naming::admin_id(&organization_name);
        let admin_password_hash = self.hash_password(password).await?;

        let record = NewOrganizationRecord {
            organization_name: organization_name.clone(),
            name_key,
            email: email.clone(),
            admin_password_hash,
            partition_name: partition_name.clone(),
            admin_id: admin_id.clone(),
        };

        // The unique index catches a concurrent create that passed the check above.
        let id = match self.catalog.insert_one(record).await {
            Ok(id) => id,
            Err(RepositoryError::Conflict(_)) => {
                return Err(RegistryError::Conflict(organization_name));
            }
            Err(e) => return Err(RegistryError::Catalog(e)),
        };

        if let Err(source) = self
            .provision_partition(&organization_name, &partition_name)
            .await
        {
            counter!("registry_partition_failures_total", "operation" => "create").increment(1);
            error!(
                organization_name = %organization_name,
                partition_name = %partition_name,
                error = %source,
                "Partition provisioning failed; catalog record left in failed state"
            );
            self.mark_failed(id, &organization_name).await;
            return Err(RegistryError::PartitionProvisioning {
                partition_name,
                source,
            });
        }

        self.catalog
            .update_one(id, RecordPatch::partition_state(PartitionState::Ready))
            .await
            .map_err(RegistryError::Catalog)?;

        counter!("registry_organizations_created_total").increment(1);
        info!(
            organization_name = %organization_name,
            partition_name = %partition_name,
            "Organization created"
        );

        Ok(OrganizationView {
            organization_name,
            email,
            partition_name,
            admin_id,
        })
    }

    pub async fn get_organization(
        &self,
        organization_name: &str,
    ) -> Result<OrganizationView, RegistryError> {
        let record = self.require(organization_name).await?;
        Ok(OrganizationView::from(&record))
    }

    /// Apply `patch` to an existing organization. An empty patch is a no-op
    /// that returns the current view.
    pub async fn update_organization(
        &self,
        organization_name: &str,
        patch: OrganizationPatch,
    ) -> Result<OrganizationView, RegistryError> {
        if let Some(email) = patch.email.as_deref() {
            validate_email(email)?;
        }
        if patch.password.as_deref() == Some("") {
            return Err(RegistryError::validation("password", "password cannot be empty"));
        }

        let record = self.require(organization_name).await?;

        let admin_password_hash = match patch.password {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };

        let changes = RecordPatch {
            email: patch.email,
            admin_password_hash,
            partition_state: None,
        };

        if changes.is_empty() {
            return Ok(OrganizationView::from(&record));
        }

        let password_changed = changes.admin_password_hash.is_some();
        let updated = self
            .catalog
            .update_one(record.id, changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => {
                    RegistryError::NotFound(organization_name.to_string())
                }
                other => RegistryError::Catalog(other),
            })?;

        info!(
            organization_name = %organization_name,
            password_changed,
            "Organization updated"
        );

        Ok(OrganizationView::from(&updated))
    }

    /// Drop the organization's partition, then remove its catalog record.
    ///
    /// A failed drop is logged and reported as [`PartitionTeardown::Orphaned`];
    /// the catalog record is removed regardless.
    pub async fn delete_organization(
        &self,
        organization_name: &str,
    ) -> Result<DeletionReport, RegistryError> {
        let record = self.require(organization_name).await?;

        let partition = match self.partitions.drop_partition(&record.partition_name).await {
            Ok(()) => PartitionTeardown::Dropped,
            Err(e) => {
                counter!("registry_partition_failures_total", "operation" => "drop").increment(1);
                warn!(
                    organization_name = %organization_name,
                    partition_name = %record.partition_name,
                    error = %e,
                    "Failed to drop partition; continuing with catalog delete"
                );
                PartitionTeardown::Orphaned {
                    reason: e.to_string(),
                }
            }
        };

        self.catalog
            .delete_one(record.id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => {
                    RegistryError::NotFound(organization_name.to_string())
                }
                other => RegistryError::Catalog(other),
            })?;

        counter!("registry_organizations_deleted_total").increment(1);
        info!(
            organization_name = %organization_name,
            partition_name = %record.partition_name,
            partition_dropped = partition == PartitionTeardown::Dropped,
            "Organization deleted"
        );

        Ok(DeletionReport {
            organization_name: record.organization_name,
            partition_name: record.partition_name,
            partition,
        })
    }

    /// Authenticate an admin by email and password.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, RegistryError> {
        let Some(record) = self
            .catalog
            .find_one(CatalogFilter::Email(email))
            .await
            .map_err(RegistryError::Catalog)?
        else {
            return Err(RegistryError::InvalidCredentials);
        };

        let credentials = Arc::clone(&self.credentials);
        let candidate = password.to_string();
        let digest = record.admin_password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || credentials.verify(&candidate, &digest))
            .await
            .map_err(|e| CredentialError::Hash(e.to_string()))?;

        match verified {
            Ok(true) => {}
            Ok(false) => return Err(RegistryError::InvalidCredentials),
            Err(e) => {
                warn!(
                    organization_name = %record.organization_name,
                    error = %e,
                    "Stored admin password digest could not be checked"
                );
                return Err(RegistryError::InvalidCredentials);
            }
        }

        let access_token = self
            .credentials
            .issue_token(&record.email, &record.organization_name)?;

        info!(organization_name = %record.organization_name, "Admin logged in");

        Ok(LoginSession {
            access_token,
            token_type: "bearer".to_string(),
            admin_email: record.email,
            organization_name: record.organization_name,
        })
    }

    /// Organizations whose partition is pending or failed.
    pub async fn list_unprovisioned(&self) -> Result<Vec<ProvisioningStatus>, RegistryError> {
        let records = self
            .catalog
            .find_unprovisioned()
            .await
            .map_err(RegistryError::Catalog)?;

        Ok(records.iter().map(ProvisioningStatus::from).collect())
    }

    /// Bring an organization's partition to [`PartitionState::Ready`].
    ///
    /// A ready record whose partition exists is left untouched. Otherwise the
    /// partition is provisioned from scratch and the record marked ready.
    pub async fn reconcile_organization(
        &self,
        organization_name: &str,
    ) -> Result<ProvisioningStatus, RegistryError> {
        let record = self.require(organization_name).await?;
        let partition_name = record.partition_name.clone();

        if record.partition_state == PartitionState::Ready {
            let exists = self
                .partitions
                .exists(&partition_name)
                .await
                .map_err(|source| RegistryError::PartitionProvisioning {
                    partition_name: partition_name.clone(),
                    source,
                })?;
            if exists {
                return Ok(ProvisioningStatus::from(&record));
            }
        }

        if let Err(source) = self
            .provision_partition(organization_name, &partition_name)
            .await
        {
            counter!("registry_partition_failures_total", "operation" => "reconcile").increment(1);
            error!(
                organization_name = %organization_name,
                partition_name = %partition_name,
                error = %source,
                "Partition reconciliation failed"
            );
            self.mark_failed(record.id, organization_name).await;
            return Err(RegistryError::PartitionProvisioning {
                partition_name,
                source,
            });
        }

        let updated = self
            .catalog
            .update_one(record.id, RecordPatch::partition_state(PartitionState::Ready))
            .await
            .map_err(RegistryError::Catalog)?;

        info!(
            organization_name = %organization_name,
            partition_name = %partition_name,
            previous_state = ?record.partition_state,
            "Partition reconciled"
        );

        Ok(ProvisioningStatus::from(&updated))
    }

    /// Create a fresh seeded partition. A table already under that name was
    /// never handed to this organization and is dropped first.
    async fn provision_partition(
        &self,
        organization_name: &str,
        partition_name: &str,
    ) -> Result<(), RepositoryError> {
        if self.partitions.exists(partition_name).await? {
            warn!(
                organization_name = %organization_name,
                partition_name = %partition_name,
                "Discarding leftover partition before provisioning"
            );
            self.partitions.drop_partition(partition_name).await?;
        }

        self.partitions
            .create_and_seed(partition_name, init_marker())
            .await
    }

    async fn require(&self, organization_name: &str) -> Result<OrganizationRecord, RegistryError> {
        if organization_name.is_empty() {
            return Err(RegistryError::validation(
                "organization_name",
                "organization name is required",
            ));
        }

        self.catalog
            .find_one(CatalogFilter::OrganizationName(organization_name))
            .await
            .map_err(RegistryError::Catalog)?
            .ok_or_else(|| RegistryError::NotFound(organization_name.to_string()))
    }

    async fn hash_password(&self, password: String) -> Result<String, RegistryError> {
        let credentials = Arc::clone(&self.credentials);
        let digest = tokio::task::spawn_blocking(move || credentials.hash(&password))
            .await
            .map_err(|e| CredentialError::Hash(e.to_string()))??;
        Ok(digest)
    }

    async fn mark_failed(&self, id: Uuid, organization_name: &str) {
        if let Err(e) = self
            .catalog
            .update_one(id, RecordPatch::partition_state(PartitionState::Failed))
            .await
        {
            error!(
                organization_name = %organization_name,
                error = %e,
                "Could not record failed partition state"
            );
        }
    }
}

fn validate_name(organization_name: &str) -> Result<(), RegistryError> {
    naming::validate_organization_name(organization_name)
        .map_err(|e| RegistryError::validation("organization_name", e.to_string()))
}

fn validate_email(email: &str) -> Result<(), RegistryError> {
    if email.is_empty() {
        return Err(RegistryError::validation("email", "email is required"));
    }
    if !naming::is_valid_email(email) {
        return Err(RegistryError::validation("email", "email must be a valid address"));
    }
    Ok(())
}
