//! Principal entity model
//!
//! This module contains the SeaORM entity model for the principals table.
//! Principals are the identities recorded as creators and updaters.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Principal entity representing an authenticated identity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "principals")]
#[schema(as = Principal)]
pub struct Model {
    /// Unique identifier for the principal (primary key)
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name
    pub name: String,

    /// Email address (unique)
    pub email: String,

    /// Unix timestamp (seconds) when the principal was created
    pub created_ts: i64,

    /// Unix timestamp (seconds) when the principal was last updated
    pub updated_ts: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
