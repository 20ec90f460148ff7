//! Database connection and pool management.
//!
//! The registry talks to two logical databases: the master catalog and the
//! tenant partition store. Both pools are opened once by the composition root
//! and shared for the life of the process. When they point at the same URL a
//! single pool serves both roles.

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Connection pools for the two stores.
#[derive(Debug, Clone)]
pub struct StorePools {
    /// Master catalog (organizations table)
    pub catalog: DatabaseConnection,
    /// Tenant partitions (one table per organization)
    pub tenants: DatabaseConnection,
}

/// Opens the catalog and tenant pools described by `cfg`.
pub async fn init_pools(cfg: &AppConfig) -> Result<StorePools> {
    let catalog = init_pool(&cfg.database_url, cfg)
        .await
        .context("failed to open catalog database")?;

    let tenants = if cfg.tenant_database_url() == cfg.database_url {
        catalog.clone()
    } else {
        init_pool(cfg.tenant_database_url(), cfg)
            .await
            .context("failed to open tenant database")?
    };

    Ok(StorePools { catalog, tenants })
}

/// Initializes a connection pool for `database_url`.
///
/// Retries with exponential backoff so the service survives a database that
/// is still starting up.
pub async fn init_pool(database_url: &str, cfg: &AppConfig) -> Result<DatabaseConnection> {
    if database_url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let max_retries = 5;
    let mut retry_delay = Duration::from_millis(100);
    let mut attempt = 1;

    loop {
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                log::info!("Successfully connected to database (attempt {})", attempt);
                return Ok(conn);
            }
            Err(e) if attempt >= max_retries => {
                log::error!(
                    "Failed to connect to database after {} attempts: {}",
                    max_retries,
                    e
                );
                return Err(DatabaseError::ConnectionFailed { source: e }.into());
            }
            Err(e) => {
                log::warn!(
                    "Database connection attempt {} failed: {}, retrying in {:?}",
                    attempt,
                    e,
                    retry_delay
                );

                sleep(retry_delay).await;
                retry_delay *= 2;
                attempt += 1;
            }
        }
    }
}

/// Applies pending catalog migrations.
pub async fn run_migrations(catalog: &DatabaseConnection) -> Result<()> {
    Migrator::up(catalog, None)
        .await
        .context("failed to apply catalog migrations")?;
    Ok(())
}

/// Health check for a database connection.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    use sea_orm::Statement;

    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}
