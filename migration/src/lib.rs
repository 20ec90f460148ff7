//! Database migrations for the organization registry catalog.
//!
//! Tenant partitions are created at runtime by the partition store and are
//! not managed here.

pub use sea_orm_migration::prelude::*;

mod m2025_12_01_000001_create_organizations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m2025_12_01_000001_create_organizations::Migration)]
    }
}
