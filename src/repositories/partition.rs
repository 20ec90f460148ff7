//! # Partition Store
//!
//! Tenant partitions as one table per organization in the tenant database.
//! Each table holds JSON documents; the first is the init marker written at
//! provisioning time.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::{Alias, ColumnDef, Expr, Query, Table};
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::registry::PartitionStore;

/// SQL partition store shared by the SQLite and Postgres backends.
#[derive(Debug, Clone)]
pub struct SqlPartitionStore {
    db: Arc<DatabaseConnection>,
}

impl SqlPartitionStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Number of documents stored in `partition_name`.
    pub async fn count_documents(&self, partition_name: &str) -> Result<i64, RepositoryError> {
        ensure_named(partition_name)?;

        let query = Query::select()
            .expr_as(Expr::cust("COUNT(*)"), Alias::new("n"))
            .from(Alias::new(partition_name))
            .to_owned();

        let backend = self.db.get_database_backend();
        let row = self
            .db
            .query_one(backend.build(&query))
            .await
            .map_err(RepositoryError::database_error)?;

        match row {
            Some(row) => row
                .try_get::<i64>("", "n")
                .map_err(RepositoryError::database_error),
            None => Ok(0),
        }
    }
}

fn ensure_named(partition_name: &str) -> Result<(), RepositoryError> {
    if partition_name.is_empty() {
        return Err(RepositoryError::validation_error(
            "partition name cannot be empty",
        ));
    }
    Ok(())
}

#[async_trait]
impl PartitionStore for SqlPartitionStore {
    async fn create_and_seed(
        &self,
        partition_name: &str,
        seed: serde_json::Value,
    ) -> Result<(), RepositoryError> {
        ensure_named(partition_name)?;

        // No IF NOT EXISTS: a leftover table must never be handed to a new tenant.
        let create = Table::create()
            .table(Alias::new(partition_name))
            .col(
                ColumnDef::new(Alias::new("id"))
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Alias::new("doc")).json_binary().not_null())
            .col(
                ColumnDef::new(Alias::new("created_at"))
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .to_owned();

        let mut insert = Query::insert();
        insert
            .into_table(Alias::new(partition_name))
            .columns([Alias::new("id"), Alias::new("doc")])
            .values([Uuid::new_v4().into(), seed.into()])
            .map_err(|e| RepositoryError::validation_error(e.to_string()))?;

        // Table and marker commit together so a partition is never left unseeded.
        let backend = self.db.get_database_backend();
        let txn = self
            .db
            .begin()
            .await
            .map_err(RepositoryError::database_error)?;
        txn.execute(backend.build(&create))
            .await
            .map_err(RepositoryError::database_error)?;
        txn.execute(backend.build(&insert))
            .await
            .map_err(RepositoryError::database_error)?;
        txn.commit()
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::debug!(partition_name, "Partition created and seeded");
        Ok(())
    }

    async fn drop_partition(&self, partition_name: &str) -> Result<(), RepositoryError> {
        ensure_named(partition_name)?;

        let drop = Table::drop()
            .table(Alias::new(partition_name))
            .if_exists()
            .to_owned();

        let backend = self.db.get_database_backend();
        self.db
            .execute(backend.build(&drop))
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::debug!(partition_name, "Partition dropped");
        Ok(())
    }

    async fn exists(&self, partition_name: &str) -> Result<bool, RepositoryError> {
        ensure_named(partition_name)?;

        let backend = self.db.get_database_backend();
        let sql = match backend {
            DatabaseBackend::Sqlite => {
                "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?"
            }
            DatabaseBackend::Postgres => {
                "SELECT COUNT(*) AS n FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = $1"
            }
            DatabaseBackend::MySql => {
                "SELECT COUNT(*) AS n FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_name = ?"
            }
        };

        let stmt = Statement::from_sql_and_values(backend, sql, [partition_name.into()]);
        let row = self
            .db
            .query_one(stmt)
            .await
            .map_err(RepositoryError::database_error)?;

        let count = match row {
            Some(row) => row
                .try_get::<i64>("", "n")
                .map_err(RepositoryError::database_error)?,
            None => 0,
        };

        Ok(count > 0)
    }
}
