//! Database migrations for the VCS link service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_10_01_090000_create_principals;
mod m2026_10_01_090100_create_vcs;
mod m2026_10_01_090200_create_projects;
mod m2026_10_01_090300_create_repositories;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_10_01_090000_create_principals::Migration),
            Box::new(m2026_10_01_090100_create_vcs::Migration),
            Box::new(m2026_10_01_090200_create_projects::Migration),
            Box::new(m2026_10_01_090300_create_repositories::Migration),
        ]
    }
}
