//! Migration to create the principals table.
//!
//! Principals are the identities recorded in creator/updater audit columns.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Principals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Principals::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Principals::Name).text().not_null())
                    .col(ColumnDef::new(Principals::Email).text().not_null())
                    .col(ColumnDef::new(Principals::CreatedTs).big_integer().not_null())
                    .col(ColumnDef::new(Principals::UpdatedTs).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_principals_email")
                    .table(Principals::Table)
                    .col(Principals::Email)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_principals_email").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Principals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Principals {
    Table,
    Id,
    Name,
    Email,
    CreatedTs,
    UpdatedTs,
}
