//! Project entity model
//!
//! This module contains the SeaORM entity model for the projects table.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Project entity owning at most one linked repository
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "projects")]
#[schema(as = Project)]
pub struct Model {
    /// Unique identifier for the project (primary key)
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name
    pub name: String,

    /// Short project key
    pub key: String,

    /// Whether schema changes are driven from the UI or from the linked repository
    pub workflow_type: WorkflowType,

    pub creator_id: i32,
    pub created_ts: i64,
    pub updater_id: i32,
    pub updated_ts: i64,
}

/// Project workflow mode
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
pub enum WorkflowType {
    /// Changes are issued through the UI
    #[sea_orm(string_value = "UI")]
    #[serde(rename = "UI")]
    #[default]
    Ui,

    /// Changes are driven by commits to the linked VCS repository
    #[sea_orm(string_value = "VCS")]
    #[serde(rename = "VCS")]
    Vcs,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::repository::Entity")]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
