//! Database-backed relation lookup used to compose repository views.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::domain::RelationLookup;
use crate::error::RepositoryError;
use crate::models::{Principal, Project, Vcs, principal, project, vcs};

/// [`RelationLookup`] over the principals, vcs and projects tables
#[derive(Debug, Clone)]
pub struct EntityRelationLookup {
    pub db: Arc<DatabaseConnection>,
}

impl EntityRelationLookup {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RelationLookup for EntityRelationLookup {
    async fn find_principal(&self, id: i32) -> Result<Option<principal::Model>, RepositoryError> {
        Ok(Principal::find_by_id(id).one(&*self.db).await?)
    }

    async fn find_vcs(&self, id: i32) -> Result<Option<vcs::Model>, RepositoryError> {
        Ok(Vcs::find_by_id(id).one(&*self.db).await?)
    }

    async fn find_project(&self, id: i32) -> Result<Option<project::Model>, RepositoryError> {
        Ok(Project::find_by_id(id).one(&*self.db).await?)
    }
}
