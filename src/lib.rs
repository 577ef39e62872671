//! # VCS Link Library
//!
//! This library links projects to repositories hosted by version-control
//! providers. It provides the domain records and [`domain::RepositoryService`]
//! contract, a SeaORM-backed store, credential sealing and the HTTP API.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
