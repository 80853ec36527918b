//! Migration to create the integration_connections table.
//!
//! Holds one boolean flag per (user, service, integration).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IntegrationConnections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IntegrationConnections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IntegrationConnections::UserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IntegrationConnections::Service)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IntegrationConnections::Integration)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IntegrationConnections::Connected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(IntegrationConnections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(IntegrationConnections::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Upserts target this composite key
        manager
            .create_index(
                Index::create()
                    .name("idx_integration_connections_user_service_integration")
                    .table(IntegrationConnections::Table)
                    .col(IntegrationConnections::UserId)
                    .col(IntegrationConnections::Service)
                    .col(IntegrationConnections::Integration)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_integration_connections_user_service_integration")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(IntegrationConnections::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IntegrationConnections {
    Table,
    Id,
    UserId,
    Service,
    Integration,
    Connected,
    CreatedAt,
    UpdatedAt,
}
