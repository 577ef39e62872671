//! Migration to create the vcs table.
//!
//! A VCS row is an account-level integration with a hosted Git service
//! (e.g. a self-hosted GitLab instance).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vcs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vcs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vcs::Name).text().not_null())
                    .col(
                        ColumnDef::new(Vcs::VcsType)
                            .text()
                            .not_null()
                            .default("GITLAB_SELF_HOST"),
                    )
                    .col(ColumnDef::new(Vcs::InstanceUrl).text().not_null())
                    .col(ColumnDef::new(Vcs::ApplicationId).text().not_null())
                    .col(ColumnDef::new(Vcs::CreatedTs).big_integer().not_null())
                    .col(ColumnDef::new(Vcs::UpdatedTs).big_integer().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vcs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Vcs {
    Table,
    Id,
    Name,
    VcsType,
    InstanceUrl,
    ApplicationId,
    CreatedTs,
    UpdatedTs,
}
