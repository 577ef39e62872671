//! Principal repository for database operations
//!
//! This module provides the PrincipalRepository struct which encapsulates
//! SeaORM operations for the principals table.

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;

use crate::models::principal::{self, Entity as Principal};

/// Repository for principal database operations
#[derive(Debug, Clone)]
pub struct PrincipalRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl PrincipalRepository {
    /// Creates a new PrincipalRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a principal; the email must be unique
    pub async fn create(&self, name: &str, email: &str) -> Result<principal::Model> {
        if email.trim().is_empty() {
            return Err(anyhow!("principal email must not be empty"));
        }

        let now = Utc::now().timestamp();
        let principal = principal::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            created_ts: Set(now),
            updated_ts: Set(now),
            ..Default::default()
        };

        Ok(principal.insert(&*self.db).await?)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<principal::Model>> {
        Ok(Principal::find_by_id(id).one(&*self.db).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<principal::Model>> {
        let principal = Principal::find()
            .filter(principal::Column::Email.eq(email))
            .one(&*self.db)
            .await?;
        Ok(principal)
    }
}
