//! # Repository Link API Handlers
//!
//! Handlers for linking, reading, patching and unlinking the VCS repository
//! of a project. Responses never carry credentials or webhook identifiers.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{OperatorAuth, PrincipalExtension, PrincipalHeader};
use crate::domain::{
    RepositoryCreate, RepositoryDelete, RepositoryFind, RepositoryPatch, RepositoryView,
    compose_repository, compose_repository_list,
};
use crate::error::ApiError;
use crate::models::{principal, project, vcs};
use crate::server::AppState;

/// Request body for linking a repository to a project
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateRepositoryRequest {
    /// VCS instance hosting the repository
    pub vcs_id: i32,
    /// Repository display name
    pub name: String,
    /// Namespace path on the provider, e.g. `org/app`
    pub full_path: String,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub branch_filter: String,
    #[serde(default)]
    pub base_directory: String,
    #[serde(default)]
    pub file_path_template: String,
    #[serde(default)]
    pub schema_path_template: String,
    /// Provider-side repository id
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub external_webhook_id: String,
    #[serde(default)]
    pub webhook_url_host: String,
    #[serde(default)]
    pub webhook_endpoint_id: String,
    #[serde(default)]
    pub webhook_secret_token: String,
    #[serde(default)]
    pub access_token: String,
    /// Unix seconds; 0 means the token never expires
    #[serde(default)]
    pub expires_ts: i64,
    #[serde(default)]
    pub refresh_token: String,
}

impl CreateRepositoryRequest {
    fn into_create(self, project_id: i32, creator_id: i32) -> RepositoryCreate {
        RepositoryCreate {
            creator_id,
            vcs_id: self.vcs_id,
            project_id,
            name: self.name,
            full_path: self.full_path,
            web_url: self.web_url,
            branch_filter: self.branch_filter,
            base_directory: self.base_directory,
            file_path_template: self.file_path_template,
            schema_path_template: self.schema_path_template,
            external_id: self.external_id,
            external_webhook_id: self.external_webhook_id,
            webhook_url_host: self.webhook_url_host,
            webhook_endpoint_id: self.webhook_endpoint_id,
            webhook_secret_token: self.webhook_secret_token,
            access_token: self.access_token,
            expires_ts: self.expires_ts,
            refresh_token: self.refresh_token,
        }
    }
}

/// Request body for a partial update; omitted fields are left unchanged.
///
/// Identity and routing fields cannot be patched, so unknown keys are rejected.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PatchRepositoryRequest {
    pub branch_filter: Option<String>,
    pub base_directory: Option<String>,
    pub file_path_template: Option<String>,
    pub schema_path_template: Option<String>,
    pub access_token: Option<String>,
    pub expires_ts: Option<i64>,
    pub refresh_token: Option<String>,
}

impl PatchRepositoryRequest {
    fn into_patch(self, id: i32, updater_id: i32) -> RepositoryPatch {
        RepositoryPatch {
            id,
            updater_id,
            branch_filter: self.branch_filter,
            base_directory: self.base_directory,
            file_path_template: self.file_path_template,
            schema_path_template: self.schema_path_template,
            access_token: self.access_token,
            expires_ts: self.expires_ts,
            refresh_token: self.refresh_token,
        }
    }
}

/// Query parameters for repository listing
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ListRepositoriesQuery {
    pub vcs_id: Option<i32>,
    pub project_id: Option<i32>,
    pub webhook_endpoint_id: Option<String>,
}

impl From<ListRepositoriesQuery> for RepositoryFind {
    fn from(query: ListRepositoriesQuery) -> Self {
        Self {
            id: None,
            vcs_id: query.vcs_id,
            project_id: query.project_id,
            webhook_endpoint_id: query.webhook_endpoint_id,
        }
    }
}

/// Repository link as returned to API clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RepositoryResponse {
    pub id: i32,

    pub creator_id: i32,
    pub creator: Option<principal::Model>,
    pub created_ts: i64,
    pub updater_id: i32,
    pub updater: Option<principal::Model>,
    pub updated_ts: i64,

    pub vcs_id: i32,
    pub vcs: Option<vcs::Model>,
    pub project_id: i32,
    pub project: Option<project::Model>,

    pub name: String,
    pub full_path: String,
    pub web_url: String,
    pub branch_filter: String,
    pub base_directory: String,
    pub file_path_template: String,
    pub schema_path_template: String,
    pub external_id: String,

    /// Indicates whether an access token is stored
    #[schema(default = false, example = true)]
    pub has_access_token: bool,
    /// Indicates whether a refresh token is stored
    #[schema(default = false, example = true)]
    pub has_refresh_token: bool,
}

impl From<RepositoryView> for RepositoryResponse {
    fn from(view: RepositoryView) -> Self {
        Self {
            id: view.id,
            creator_id: view.creator_id,
            creator: view.creator,
            created_ts: view.created_ts,
            updater_id: view.updater_id,
            updater: view.updater,
            updated_ts: view.updated_ts,
            vcs_id: view.vcs_id,
            vcs: view.vcs,
            project_id: view.project_id,
            project: view.project,
            name: view.name,
            full_path: view.full_path,
            web_url: view.web_url,
            branch_filter: view.branch_filter,
            base_directory: view.base_directory,
            file_path_template: view.file_path_template,
            schema_path_template: view.schema_path_template,
            external_id: view.external_id,
            has_access_token: !view.access_token.is_empty(),
            has_refresh_token: !view.refresh_token.is_empty(),
        }
    }
}

/// Response wrapper for repository listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RepositoriesResponse {
    pub repositories: Vec<RepositoryResponse>,
}

/// Links a repository to the project
#[utoipa::path(
    post,
    path = "/projects/{project_id}/repository",
    security(("bearer_auth" = [])),
    params(
        ("project_id" = i32, Path, description = "Project to link"),
        PrincipalHeader
    ),
    request_body = CreateRepositoryRequest,
    responses(
        (status = 201, description = "Repository linked", body = RepositoryResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Project already linked or webhook endpoint in use", body = ApiError),
        (status = 422, description = "Referenced VCS, project or principal does not exist", body = ApiError)
    ),
    tag = "repositories"
)]
pub async fn create_repository(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    PrincipalExtension(principal): PrincipalExtension,
    Path(project_id): Path<i32>,
    payload: Result<Json<CreateRepositoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RepositoryResponse>), ApiError> {
    let Json(request) = payload?;
    let create = request.into_create(project_id, principal.0);

    let record = state.repositories.create_repository(&create).await?;
    let view = compose_repository(&record, state.relations.as_ref()).await?;

    Ok((StatusCode::CREATED, Json(view.into())))
}

/// Returns the repository linked to the project
#[utoipa::path(
    get,
    path = "/projects/{project_id}/repository",
    security(("bearer_auth" = [])),
    params(
        ("project_id" = i32, Path, description = "Project whose repository to return"),
        PrincipalHeader
    ),
    responses(
        (status = 200, description = "Linked repository", body = RepositoryResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Project has no linked repository", body = ApiError)
    ),
    tag = "repositories"
)]
pub async fn get_project_repository(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(project_id): Path<i32>,
) -> Result<Json<RepositoryResponse>, ApiError> {
    let record = state
        .repositories
        .find_repository(&RepositoryFind::by_project(project_id))
        .await?;
    let view = compose_repository(&record, state.relations.as_ref()).await?;

    Ok(Json(view.into()))
}

/// Updates the repository linked to the project
#[utoipa::path(
    patch,
    path = "/projects/{project_id}/repository",
    security(("bearer_auth" = [])),
    params(
        ("project_id" = i32, Path, description = "Project whose repository to update"),
        PrincipalHeader
    ),
    request_body = PatchRepositoryRequest,
    responses(
        (status = 200, description = "Updated repository", body = RepositoryResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Project has no linked repository", body = ApiError)
    ),
    tag = "repositories"
)]
pub async fn patch_project_repository(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    PrincipalExtension(principal): PrincipalExtension,
    Path(project_id): Path<i32>,
    payload: Result<Json<PatchRepositoryRequest>, JsonRejection>,
) -> Result<Json<RepositoryResponse>, ApiError> {
    let Json(request) = payload?;

    let current = state
        .repositories
        .find_repository(&RepositoryFind::by_project(project_id))
        .await?;
    let patch = request.into_patch(current.id, principal.0);

    let record = state.repositories.patch_repository(&patch).await?;
    let view = compose_repository(&record, state.relations.as_ref()).await?;

    Ok(Json(view.into()))
}

/// Unlinks the repository and returns the project to the UI workflow
#[utoipa::path(
    delete,
    path = "/projects/{project_id}/repository",
    security(("bearer_auth" = [])),
    params(
        ("project_id" = i32, Path, description = "Project to unlink"),
        PrincipalHeader
    ),
    responses(
        (status = 204, description = "Repository unlinked"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Project has no linked repository", body = ApiError)
    ),
    tag = "repositories"
)]
pub async fn delete_project_repository(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    PrincipalExtension(principal): PrincipalExtension,
    Path(project_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state
        .repositories
        .delete_repository(&RepositoryDelete {
            project_id,
            deleter_id: principal.0,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists repository links matching the optional filters
#[utoipa::path(
    get,
    path = "/repositories",
    security(("bearer_auth" = [])),
    params(ListRepositoriesQuery, PrincipalHeader),
    responses(
        (status = 200, description = "Matching repositories in ascending id order", body = RepositoriesResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "repositories"
)]
pub async fn list_repositories(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    query: Result<Query<ListRepositoriesQuery>, QueryRejection>,
) -> Result<Json<RepositoriesResponse>, ApiError> {
    let Query(query) = query?;
    let find = RepositoryFind::from(query);

    let records = state.repositories.find_repository_list(&find).await?;
    let views = compose_repository_list(&records, state.relations.as_ref()).await?;

    Ok(Json(RepositoriesResponse {
        repositories: views.into_iter().map(RepositoryResponse::from).collect(),
    }))
}
