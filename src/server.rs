//! # Server Configuration
//!
//! This module contains the server setup and configuration for the VCS link API.

use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::crypto::CryptoKey;
use crate::domain::{RelationLookup, RepositoryService};
use crate::handlers;
use crate::repositories::{EntityRelationLookup, RepositoryStore};
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub repositories: Arc<dyn RepositoryService>,
    pub relations: Arc<dyn RelationLookup>,
}

impl AppState {
    /// Wires the SeaORM-backed service and relation lookup over `db`.
    pub fn new(config: AppConfig, db: DatabaseConnection, crypto_key: CryptoKey) -> Self {
        let db = Arc::new(db);
        Self {
            config: Arc::new(config),
            repositories: Arc::new(RepositoryStore::new(Arc::clone(&db), crypto_key)),
            relations: Arc::new(EntityRelationLookup::new(Arc::clone(&db))),
            db,
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/projects/{project_id}/repository",
            get(handlers::repositories::get_project_repository)
                .post(handlers::repositories::create_repository)
                .patch(handlers::repositories::patch_project_repository)
                .delete(handlers::repositories::delete_project_repository),
        )
        .route("/repositories", get(handlers::repositories::list_repositories))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let crypto_key = config.crypto_key()?;
    let addr = config.bind_addr().context("Invalid server address")?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db, crypto_key));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::repositories::create_repository,
        crate::handlers::repositories::get_project_repository,
        crate::handlers::repositories::patch_project_repository,
        crate::handlers::repositories::delete_project_repository,
        crate::handlers::repositories::list_repositories,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthStatus,
            crate::error::ApiError,
            crate::handlers::repositories::CreateRepositoryRequest,
            crate::handlers::repositories::PatchRepositoryRequest,
            crate::handlers::repositories::RepositoryResponse,
            crate::handlers::repositories::RepositoriesResponse,
            crate::models::principal::Model,
            crate::models::vcs::Model,
            crate::models::vcs::VcsType,
            crate::models::project::Model,
            crate::models::project::WorkflowType,
        )
    ),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "repositories", description = "Project to VCS repository links"),
    ),
    info(
        title = "VCS Link API",
        description = "API for linking projects to version-control repositories",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
