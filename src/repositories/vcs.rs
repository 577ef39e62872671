//! VCS repository for database operations
//!
//! This module provides the VcsRepository struct which encapsulates
//! SeaORM operations for the vcs table.

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;

use crate::models::vcs::{self, Entity as Vcs, VcsType};

/// Repository for VCS database operations
#[derive(Debug, Clone)]
pub struct VcsRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl VcsRepository {
    /// Creates a new VcsRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Registers a VCS instance. `instance_url` must be an absolute URL.
    pub async fn create(
        &self,
        name: &str,
        vcs_type: VcsType,
        instance_url: &str,
        application_id: &str,
    ) -> Result<vcs::Model> {
        let parsed = url::Url::parse(instance_url)
            .map_err(|e| anyhow!("invalid instance url '{}': {}", instance_url, e))?;

        let now = Utc::now().timestamp();
        let vcs = vcs::ActiveModel {
            name: Set(name.to_string()),
            vcs_type: Set(vcs_type),
            // Stored without a trailing slash so paths can be appended
            instance_url: Set(parsed.as_str().trim_end_matches('/').to_string()),
            application_id: Set(application_id.to_string()),
            created_ts: Set(now),
            updated_ts: Set(now),
            ..Default::default()
        };

        Ok(vcs.insert(&*self.db).await?)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<vcs::Model>> {
        Ok(Vcs::find_by_id(id).one(&*self.db).await?)
    }
}
