//! # Domain
//!
//! Repository link records, request messages, the [`RepositoryService`]
//! contract and relation composition. Nothing here touches storage.

pub mod compose;
pub mod repository;

pub use compose::{RelationLookup, compose_repository, compose_repository_list};
pub use repository::{
    RepositoryCreate, RepositoryDelete, RepositoryFind, RepositoryPatch, RepositoryRecord,
    RepositoryService, RepositoryView,
};
