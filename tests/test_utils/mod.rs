//! Test utilities for database testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations applied, and for seeding the principals, VCS instances and
//! projects a repository link refers to.

#![allow(dead_code)]

use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use std::sync::Arc;
use vcs_link::config::AppConfig;
use vcs_link::crypto::CryptoKey;
use vcs_link::domain::RepositoryCreate;
use vcs_link::models::{principal, project, vcs};
use vcs_link::repositories::{
    PrincipalRepository, ProjectRepository, RepositoryStore, VcsRepository,
};
use vcs_link::server::AppState;

pub const OPERATOR_TOKEN: &str = "test-operator-token";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    // Foreign keys stay enforced so fixtures mirror Postgres behaviour
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = ON".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Sets up an in-memory SQLite database and returns it wrapped in an Arc.
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    Ok(Arc::new(setup_test_db().await?))
}

/// Deterministic 32-byte sealing key for tests
pub fn test_crypto_key() -> CryptoKey {
    CryptoKey::new(vec![0x42; 32]).expect("valid test key")
}

/// Configuration accepted by the auth middleware in router tests
pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        operator_tokens: vec![OPERATOR_TOKEN.to_string()],
        crypto_key: Some(vec![0x42; 32]),
        ..AppConfig::default()
    }
}

/// Seeded rows every repository link test needs.
pub struct Fixture {
    pub db: Arc<DatabaseConnection>,
    pub store: RepositoryStore,
    pub creator: principal::Model,
    pub updater: principal::Model,
    pub vcs: vcs::Model,
    pub project: project::Model,
}

impl Fixture {
    /// Minimal valid create request for the seeded project
    pub fn create_request(&self) -> RepositoryCreate {
        RepositoryCreate {
            creator_id: self.creator.id,
            vcs_id: self.vcs.id,
            project_id: self.project.id,
            name: "app".to_string(),
            full_path: "org/app".to_string(),
            ..RepositoryCreate::default()
        }
    }

    /// Adds another project owned by the fixture creator
    pub async fn add_project(&self, key: &str) -> Result<project::Model> {
        ProjectRepository::new(Arc::clone(&self.db))
            .create(&format!("Project {key}"), key, self.creator.id)
            .await
    }

    /// Reloads a project row
    pub async fn reload_project(&self, id: i32) -> Result<project::Model> {
        ProjectRepository::new(Arc::clone(&self.db))
            .find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("project {id} vanished"))
    }

    /// State for router tests sharing this fixture's database
    pub fn app_state(&self) -> AppState {
        AppState::new(
            test_config(),
            self.db.as_ref().clone(),
            test_crypto_key(),
        )
    }
}

/// Creates a database with two principals, one VCS and one UI-workflow project.
pub async fn setup_fixture() -> Result<Fixture> {
    let db = setup_test_db_arc().await?;

    let principals = PrincipalRepository::new(Arc::clone(&db));
    let creator = principals.create("Ada", "ada@example.com").await?;
    let updater = principals.create("Grace", "grace@example.com").await?;

    let vcs = VcsRepository::new(Arc::clone(&db))
        .create(
            "GitLab",
            vcs::VcsType::GitlabSelfHost,
            "https://gitlab.example.com/",
            "gitlab-app-id",
        )
        .await?;

    let project = ProjectRepository::new(Arc::clone(&db))
        .create("Payments", "PAY", creator.id)
        .await?;

    let store = RepositoryStore::new(Arc::clone(&db), test_crypto_key());

    Ok(Fixture {
        db,
        store,
        creator,
        updater,
        vcs,
        project,
    })
}
