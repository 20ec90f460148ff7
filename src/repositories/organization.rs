//! # Organization Repository
//!
//! SeaORM-backed catalog store over the `organizations` table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::PartitionState;
use crate::models::organization::{
    ActiveModel as OrganizationActiveModel, Column, Entity as Organization,
    Model as OrganizationModel,
};
use crate::registry::{CatalogFilter, CatalogStore, NewOrganizationRecord, RecordPatch};

/// Repository for organization catalog records
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: Arc<DatabaseConnection>,
}

impl OrganizationRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrganizationModel>, RepositoryError> {
        Organization::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }
}

#[async_trait]
impl CatalogStore for OrganizationRepository {
    async fn find_one(
        &self,
        filter: CatalogFilter<'_>,
    ) -> Result<Option<OrganizationModel>, RepositoryError> {
        let query = match filter {
            CatalogFilter::OrganizationName(name) => {
                Organization::find().filter(Column::OrganizationName.eq(name))
            }
            CatalogFilter::NameKey(key) => Organization::find().filter(Column::NameKey.eq(key)),
            CatalogFilter::Email(email) => Organization::find()
                .filter(Column::Email.eq(email))
                .order_by_asc(Column::CreatedAt)
                .order_by_asc(Column::Id),
        };

        query
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn insert_one(&self, record: NewOrganizationRecord) -> Result<Uuid, RepositoryError> {
        let now = Utc::now();

        let organization = OrganizationActiveModel {
            id: Set(Uuid::new_v4()),
            organization_name: Set(record.organization_name),
            name_key: Set(record.name_key),
            email: Set(record.email),
            admin_password_hash: Set(record.admin_password_hash),
            partition_name: Set(record.partition_name),
            admin_id: Set(record.admin_id),
            partition_state: Set(PartitionState::Pending),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let inserted = organization
            .insert(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(inserted.id)
    }

    async fn update_one(
        &self,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<OrganizationModel, RepositoryError> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("organization {id}")))?;

        if patch.is_empty() {
            return Ok(existing);
        }

        let mut active = existing.into_active_model();
        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(digest) = patch.admin_password_hash {
            active.admin_password_hash = Set(digest);
        }
        if let Some(state) = patch.partition_state {
            active.partition_state = Set(state);
        }
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn delete_one(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = Organization::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(format!("organization {id}")));
        }

        Ok(())
    }

    async fn find_unprovisioned(&self) -> Result<Vec<OrganizationModel>, RepositoryError> {
        Organization::find()
            .filter(Column::PartitionState.ne(PartitionState::Ready))
            .order_by_asc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(RepositoryError::database_error)
    }
}
