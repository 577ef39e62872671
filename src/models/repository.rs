//! Repository entity model
//!
//! This module contains the SeaORM entity model for the repositories table,
//! which links a project to a repository hosted by a VCS. Credentials are
//! persisted as ciphertext; see [`crate::crypto`].

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

/// Persisted repository row
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub creator_id: i32,
    pub created_ts: i64,
    pub updater_id: i32,
    pub updated_ts: i64,

    pub vcs_id: i32,
    /// Unique: a project links at most one repository
    pub project_id: i32,

    pub name: String,
    pub full_path: String,
    pub web_url: String,
    pub branch_filter: String,
    pub base_directory: String,
    pub file_path_template: String,
    pub schema_path_template: String,
    pub external_id: String,
    pub external_webhook_id: String,
    pub webhook_url_host: String,
    pub webhook_endpoint_id: String,

    /// Sealed webhook secret token
    pub webhook_secret_token_ciphertext: Vec<u8>,
    /// Sealed OAuth access token
    pub access_token_ciphertext: Vec<u8>,
    /// Access token expiry (Unix seconds, 0 = never expires)
    pub expires_ts: i64,
    /// Sealed OAuth refresh token
    pub refresh_token_ciphertext: Vec<u8>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vcs::Entity",
        from = "Column::VcsId",
        to = "super::vcs::Column::Id"
    )]
    Vcs,

    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
}

impl Related<super::vcs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vcs.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
