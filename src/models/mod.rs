//! # Data Models
//!
//! This module contains the SeaORM entities backing the VCS link service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod principal;
pub mod project;
pub mod repository;
pub mod vcs;

pub use principal::Entity as Principal;
pub use project::Entity as Project;
pub use repository::Entity as Repository;
pub use vcs::Entity as Vcs;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "vcs-link".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
