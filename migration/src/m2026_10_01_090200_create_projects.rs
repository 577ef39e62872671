//! Migration to create the projects table.
//!
//! `workflow_type` records whether schema changes for the project are driven
//! from the UI or from commits to a linked VCS repository.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Name).text().not_null())
                    .col(ColumnDef::new(Projects::Key).text().not_null())
                    .col(
                        ColumnDef::new(Projects::WorkflowType)
                            .text()
                            .not_null()
                            .default("UI"),
                    )
                    .col(ColumnDef::new(Projects::CreatorId).integer().not_null())
                    .col(ColumnDef::new(Projects::CreatedTs).big_integer().not_null())
                    .col(ColumnDef::new(Projects::UpdaterId).integer().not_null())
                    .col(ColumnDef::new(Projects::UpdatedTs).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_creator_id")
                            .from(Projects::Table, Projects::CreatorId)
                            .to(Principals::Table, Principals::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_updater_id")
                            .from(Projects::Table, Projects::UpdaterId)
                            .to(Principals::Table, Principals::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Name,
    Key,
    WorkflowType,
    CreatorId,
    CreatedTs,
    UpdaterId,
    UpdatedTs,
}

#[derive(DeriveIden)]
enum Principals {
    Table,
    Id,
}
