//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities. [`RepositoryStore`] is the storage implementation of
//! [`crate::domain::RepositoryService`].

pub mod principal;
pub mod project;
pub mod relations;
pub mod repository;
pub mod vcs;

pub use principal::PrincipalRepository;
pub use project::ProjectRepository;
pub use relations::EntityRelationLookup;
pub use repository::RepositoryStore;
pub use vcs::VcsRepository;
