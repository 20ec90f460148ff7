//! Organization entity model
//!
//! SeaORM entity for the `organizations` catalog table. One row per
//! organization, carrying the admin credentials and the name of the tenant
//! partition provisioned for it.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Provisioning state of an organization's tenant partition.
///
/// Create and delete span two stores without a shared transaction, so the
/// catalog row records how far the partition step got.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PartitionState {
    /// Catalog row written, partition not yet provisioned.
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,

    /// Partition provisioned and seeded.
    #[sea_orm(string_value = "ready")]
    Ready,

    /// Partition provisioning failed; needs reconciliation.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Organization catalog record
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    /// Storage key assigned on insert
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Unique, immutable organization name
    #[sea_orm(unique)]
    pub organization_name: String,

    /// Case-folded organization name, unique across the catalog
    #[sea_orm(unique)]
    pub name_key: String,

    /// Admin contact and login address
    pub email: String,

    /// Opaque password digest; never leaves the service
    pub admin_password_hash: String,

    /// Name of the tenant partition, fixed at creation
    pub partition_name: String,

    /// Denormalized admin identifier
    pub admin_id: String,

    pub partition_state: PartitionState,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
