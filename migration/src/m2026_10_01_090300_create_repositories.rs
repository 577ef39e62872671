//! Migration to create the repositories table.
//!
//! A repository row links one project to one repository hosted by a VCS.
//! Access/refresh tokens and the webhook secret are stored as AES-GCM
//! ciphertext, never as plaintext.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repositories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Repositories::CreatorId).integer().not_null())
                    .col(
                        ColumnDef::new(Repositories::CreatedTs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Repositories::UpdaterId).integer().not_null())
                    .col(
                        ColumnDef::new(Repositories::UpdatedTs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Repositories::VcsId).integer().not_null())
                    .col(ColumnDef::new(Repositories::ProjectId).integer().not_null())
                    .col(ColumnDef::new(Repositories::Name).text().not_null())
                    .col(ColumnDef::new(Repositories::FullPath).text().not_null())
                    .col(ColumnDef::new(Repositories::WebUrl).text().not_null())
                    .col(
                        ColumnDef::new(Repositories::BranchFilter)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Repositories::BaseDirectory)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Repositories::FilePathTemplate)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Repositories::SchemaPathTemplate)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Repositories::ExternalId).text().not_null())
                    .col(
                        ColumnDef::new(Repositories::ExternalWebhookId)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Repositories::WebhookUrlHost)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Repositories::WebhookEndpointId)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Repositories::WebhookSecretTokenCiphertext)
                            .binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::AccessTokenCiphertext)
                            .binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::ExpiresTs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Repositories::RefreshTokenCiphertext)
                            .binary()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repositories_vcs_id")
                            .from(Repositories::Table, Repositories::VcsId)
                            .to(Vcs::Table, Vcs::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repositories_project_id")
                            .from(Repositories::Table, Repositories::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repositories_creator_id")
                            .from(Repositories::Table, Repositories::CreatorId)
                            .to(Principals::Table, Principals::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repositories_updater_id")
                            .from(Repositories::Table, Repositories::UpdaterId)
                            .to(Principals::Table, Principals::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One repository per project
        manager
            .create_index(
                Index::create()
                    .name("idx_repositories_project_id")
                    .table(Repositories::Table)
                    .col(Repositories::ProjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Inbound webhooks are routed by endpoint id; empty ids may repeat
        let backend = manager.get_database_backend();
        manager
            .get_connection()
            .execute(Statement::from_string(
                backend,
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_repositories_webhook_endpoint_id \
                 ON repositories (webhook_endpoint_id) \
                 WHERE webhook_endpoint_id <> ''"
                    .to_string(),
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_repositories_vcs_id")
                    .table(Repositories::Table)
                    .col(Repositories::VcsId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_repositories_project_id",
            "idx_repositories_webhook_endpoint_id",
            "idx_repositories_vcs_id",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(Repositories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Repositories {
    Table,
    Id,
    CreatorId,
    CreatedTs,
    UpdaterId,
    UpdatedTs,
    VcsId,
    ProjectId,
    Name,
    FullPath,
    WebUrl,
    BranchFilter,
    BaseDirectory,
    FilePathTemplate,
    SchemaPathTemplate,
    ExternalId,
    ExternalWebhookId,
    WebhookUrlHost,
    WebhookEndpointId,
    WebhookSecretTokenCiphertext,
    AccessTokenCiphertext,
    ExpiresTs,
    RefreshTokenCiphertext,
}

#[derive(DeriveIden)]
enum Vcs {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Principals {
    Table,
    Id,
}
