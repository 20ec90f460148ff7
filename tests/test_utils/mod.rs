//! Test utilities for database testing.
//!
//! In-memory SQLite stores with the catalog migrations applied, plus a
//! registry wired over them with cheap password hashing.

use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use org_registry::credentials::Argon2JwtCredentials;
use org_registry::registry::OrganizationRegistry;
use org_registry::repositories::{OrganizationRepository, SqlPartitionStore};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;

/// Opens a single-connection in-memory SQLite database.
///
/// Each connection to `sqlite::memory:` is its own database, so the pool is
/// capped at one connection.
pub async fn memory_db() -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    Ok(Database::connect(opt).await?)
}

/// Sets up an in-memory SQLite catalog with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = memory_db().await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Credentials with minimal Argon2 cost.
#[allow(dead_code)]
pub fn test_credentials() -> Arc<Argon2JwtCredentials> {
    Arc::new(
        Argon2JwtCredentials::new("integration-test-secret", "HS256", 30)
            .and_then(|c| c.with_argon2_params(1024, 1, 1))
            .expect("test credentials"),
    )
}

/// Registry over the given catalog and tenant connections.
#[allow(dead_code)]
pub fn registry_over(
    catalog: &DatabaseConnection,
    tenants: &DatabaseConnection,
) -> (OrganizationRegistry, Arc<SqlPartitionStore>) {
    let partitions = Arc::new(SqlPartitionStore::new(Arc::new(tenants.clone())));
    let registry = OrganizationRegistry::new(
        Arc::new(OrganizationRepository::new(Arc::new(catalog.clone()))),
        partitions.clone(),
        test_credentials(),
    );
    (registry, partitions)
}
