//! Migration to create the organizations catalog table.
//!
//! Each row describes one organization and the tenant partition that was
//! provisioned for it. Both the organization name and its case-folded key are
//! unique so concurrent creates cannot slip past the registry's advisory check.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organizations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Organizations::OrganizationName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Organizations::NameKey)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Organizations::Email).text().not_null())
                    .col(
                        ColumnDef::new(Organizations::AdminPasswordHash)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Organizations::PartitionName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Organizations::AdminId).text().not_null())
                    .col(
                        ColumnDef::new(Organizations::PartitionState)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Organizations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Organizations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_organizations_organization_name")
                    .table(Organizations::Table)
                    .col(Organizations::OrganizationName)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_organizations_name_key")
                    .table(Organizations::Table)
                    .col(Organizations::NameKey)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Login looks organizations up by admin email.
        manager
            .create_index(
                Index::create()
                    .name("idx_organizations_email")
                    .table(Organizations::Table)
                    .col(Organizations::Email)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_organizations_partition_state")
                    .table(Organizations::Table)
                    .col(Organizations::PartitionState)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Organizations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
    OrganizationName,
    NameKey,
    Email,
    AdminPasswordHash,
    PartitionName,
    AdminId,
    PartitionState,
    CreatedAt,
    UpdatedAt,
}
