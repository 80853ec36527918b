//! Migration to create the profiles table.
//!
//! One row per user. Provider secrets are stored as AES-GCM ciphertext;
//! Merge identifiers are plain text.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profiles::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profiles::Email).text().null())
                    .col(ColumnDef::new(Profiles::FullName).text().null())
                    .col(
                        ColumnDef::new(Profiles::ParagonTokenCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Profiles::IntegrationAppTokenCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(ColumnDef::new(Profiles::MergeUserId).text().null())
                    .col(ColumnDef::new(Profiles::MergeHandlerId).text().null())
                    .col(
                        ColumnDef::new(Profiles::MergeLinkTokenCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Profiles::MergeAccountTokenCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Profiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    UserId,
    Email,
    FullName,
    ParagonTokenCiphertext,
    IntegrationAppTokenCiphertext,
    MergeUserId,
    MergeHandlerId,
    MergeLinkTokenCiphertext,
    MergeAccountTokenCiphertext,
    CreatedAt,
    UpdatedAt,
}
