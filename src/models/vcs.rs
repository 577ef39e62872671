//! VCS entity model
//!
//! This module contains the SeaORM entity model for the vcs table, an
//! account-level integration with a hosted Git service.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// VCS provider connection
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "vcs")]
#[schema(as = Vcs)]
pub struct Model {
    /// Unique identifier for the VCS (primary key)
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name of the integration
    pub name: String,

    /// Provider kind
    pub vcs_type: VcsType,

    /// Base URL of the provider instance, e.g. `https://gitlab.example.com`
    pub instance_url: String,

    /// OAuth application id registered on the provider
    pub application_id: String,

    /// Unix timestamp (seconds) when the VCS was created
    pub created_ts: i64,

    /// Unix timestamp (seconds) when the VCS was last updated
    pub updated_ts: i64,
}

/// Supported provider kinds
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum VcsType {
    #[sea_orm(string_value = "GITLAB_SELF_HOST")]
    #[serde(rename = "GITLAB_SELF_HOST")]
    #[default]
    GitlabSelfHost,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::repository::Entity")]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
