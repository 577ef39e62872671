//! Project repository for database operations
//!
//! This module provides the ProjectRepository struct which encapsulates
//! SeaORM operations for the projects table, including the workflow switch
//! that accompanies linking and unlinking a repository.

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, Set,
};
use std::sync::Arc;

use crate::models::project::{self, Entity as Project, WorkflowType};

/// Repository for project database operations
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ProjectRepository {
    /// Creates a new ProjectRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a project in the UI workflow
    pub async fn create(&self, name: &str, key: &str, creator_id: i32) -> Result<project::Model> {
        if key.trim().is_empty() {
            return Err(anyhow!("project key must not be empty"));
        }

        let now = Utc::now().timestamp();
        let project = project::ActiveModel {
            name: Set(name.to_string()),
            key: Set(key.to_string()),
            workflow_type: Set(WorkflowType::Ui),
            creator_id: Set(creator_id),
            created_ts: Set(now),
            updater_id: Set(creator_id),
            updated_ts: Set(now),
            ..Default::default()
        };

        Ok(project.insert(&*self.db).await?)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<project::Model>> {
        Ok(Project::find_by_id(id).one(&*self.db).await?)
    }
}

/// Sets the workflow type of `project` on `conn`, recording `updater_id`.
///
/// Takes any connection so callers can run it inside their own transaction.
pub async fn set_workflow_type<C>(
    conn: &C,
    project: project::Model,
    workflow_type: WorkflowType,
    updater_id: i32,
    updated_ts: i64,
) -> Result<project::Model, DbErr>
where
    C: ConnectionTrait,
{
    let mut active = project.into_active_model();
    active.workflow_type = Set(workflow_type);
    active.updater_id = Set(updater_id);
    active.updated_ts = Set(updated_ts);
    active.update(conn).await
}
