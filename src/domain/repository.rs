//! Repository link records, request messages and the service contract.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::RepositoryError;
use crate::models::{principal, project, vcs};

/// A repository link as stored, with credentials already opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub id: i32,

    pub creator_id: i32,
    pub created_ts: i64,
    pub updater_id: i32,
    pub updated_ts: i64,

    pub vcs_id: i32,
    pub project_id: i32,

    pub name: String,
    pub full_path: String,
    pub web_url: String,
    pub branch_filter: String,
    pub base_directory: String,
    pub file_path_template: String,
    pub schema_path_template: String,
    pub external_id: String,
    pub external_webhook_id: String,
    pub webhook_url_host: String,
    pub webhook_endpoint_id: String,
    pub webhook_secret_token: String,
    pub access_token: String,
    /// Unix seconds; 0 means the access token never expires
    pub expires_ts: i64,
    pub refresh_token: String,
}

/// Repository link with optionally resolved relations.
///
/// The raw IDs are authoritative. Relation fields are only populated by
/// [`crate::domain::compose_repository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryView {
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
    pub external_webhook_id: String,
    pub webhook_url_host: String,
    pub webhook_endpoint_id: String,
    pub webhook_secret_token: String,
    pub access_token: String,
    pub expires_ts: i64,
    pub refresh_token: String,
}

impl From<&RepositoryRecord> for RepositoryView {
    fn from(record: &RepositoryRecord) -> Self {
        Self {
            id: record.id,
            creator_id: record.creator_id,
            creator: None,
            created_ts: record.created_ts,
            updater_id: record.updater_id,
            updater: None,
            updated_ts: record.updated_ts,
            vcs_id: record.vcs_id,
            vcs: None,
            project_id: record.project_id,
            project: None,
            name: record.name.clone(),
            full_path: record.full_path.clone(),
            web_url: record.web_url.clone(),
            branch_filter: record.branch_filter.clone(),
            base_directory: record.base_directory.clone(),
            file_path_template: record.file_path_template.clone(),
            schema_path_template: record.schema_path_template.clone(),
            external_id: record.external_id.clone(),
            external_webhook_id: record.external_webhook_id.clone(),
            webhook_url_host: record.webhook_url_host.clone(),
            webhook_endpoint_id: record.webhook_endpoint_id.clone(),
            webhook_secret_token: record.webhook_secret_token.clone(),
            access_token: record.access_token.clone(),
            expires_ts: record.expires_ts,
            refresh_token: record.refresh_token.clone(),
        }
    }
}

impl From<RepositoryRecord> for RepositoryView {
    fn from(record: RepositoryRecord) -> Self {
        Self::from(&record)
    }
}

impl RepositoryRecord {
    /// Converts to the view form with every relation unset.
    pub fn to_view(&self) -> RepositoryView {
        RepositoryView::from(self)
    }
}

/// Request to link a repository to a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryCreate {
    /// Set from the authenticated caller, never from a client payload
    pub creator_id: i32,

    pub vcs_id: i32,
    pub project_id: i32,

    pub name: String,
    pub full_path: String,
    pub web_url: String,
    pub branch_filter: String,
    pub base_directory: String,
    pub file_path_template: String,
    pub schema_path_template: String,
    pub external_id: String,
    pub external_webhook_id: String,
    pub webhook_url_host: String,
    pub webhook_endpoint_id: String,
    pub webhook_secret_token: String,
    pub access_token: String,
    pub expires_ts: i64,
    pub refresh_token: String,
}

impl RepositoryCreate {
    /// Checks field shapes. Reference existence is checked by the store.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        require_positive("creator_id", self.creator_id)?;
        require_positive("vcs_id", self.vcs_id)?;
        require_positive("project_id", self.project_id)?;
        require_non_blank("name", &self.name)?;
        require_non_blank("full_path", &self.full_path)?;

        if !self.web_url.is_empty() {
            url::Url::parse(&self.web_url)
                .map_err(|e| RepositoryError::validation("web_url", e.to_string()))?;
        }

        require_non_negative_expiry(self.expires_ts)
    }
}

/// Filter for repository lookups. Absent fields place no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFind {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_endpoint_id: Option<String>,
}

impl RepositoryFind {
    pub fn by_id(id: i32) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_project(project_id: i32) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    pub fn by_webhook_endpoint(webhook_endpoint_id: impl Into<String>) -> Self {
        Self {
            webhook_endpoint_id: Some(webhook_endpoint_id.into()),
            ..Self::default()
        }
    }
}

impl fmt::Display for RepositoryFind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

/// Partial update of a repository link.
///
/// `None` leaves a field unchanged; `Some` overwrites it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryPatch {
    pub id: i32,
    pub updater_id: i32,

    pub branch_filter: Option<String>,
    pub base_directory: Option<String>,
    pub file_path_template: Option<String>,
    pub schema_path_template: Option<String>,
    pub access_token: Option<String>,
    pub expires_ts: Option<i64>,
    pub refresh_token: Option<String>,
}

impl RepositoryPatch {
    pub fn new(id: i32, updater_id: i32) -> Self {
        Self {
            id,
            updater_id,
            ..Self::default()
        }
    }

    /// True when the patch carries no field besides the audit information
    pub fn is_audit_only(&self) -> bool {
        self.branch_filter.is_none()
            && self.base_directory.is_none()
            && self.file_path_template.is_none()
            && self.schema_path_template.is_none()
            && self.access_token.is_none()
            && self.expires_ts.is_none()
            && self.refresh_token.is_none()
    }

    pub fn validate(&self) -> Result<(), RepositoryError> {
        require_positive("id", self.id)?;
        require_positive("updater_id", self.updater_id)?;
        match self.expires_ts {
            Some(expires_ts) => require_non_negative_expiry(expires_ts),
            None => Ok(()),
        }
    }
}

/// Request to unlink the repository of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryDelete {
    pub project_id: i32,
    /// Recorded as the project's updater when its workflow reverts to UI
    pub deleter_id: i32,
}

impl RepositoryDelete {
    pub fn validate(&self) -> Result<(), RepositoryError> {
        require_positive("project_id", self.project_id)?;
        require_positive("deleter_id", self.deleter_id)
    }
}

fn require_positive(field: &'static str, value: i32) -> Result<(), RepositoryError> {
    if value <= 0 {
        return Err(RepositoryError::validation(field, "must be a positive id"));
    }
    Ok(())
}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), RepositoryError> {
    if value.trim().is_empty() {
        return Err(RepositoryError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn require_non_negative_expiry(expires_ts: i64) -> Result<(), RepositoryError> {
    if expires_ts < 0 {
        return Err(RepositoryError::validation(
            "expires_ts",
            "must be 0 (never expires) or a Unix timestamp",
        ));
    }
    Ok(())
}

/// Storage-independent operations on repository links.
///
/// Every operation is atomic: on error nothing has been changed.
#[async_trait]
pub trait RepositoryService: Send + Sync {
    /// Links a repository to a project and switches the project to the VCS workflow.
    async fn create_repository(
        &self,
        create: &RepositoryCreate,
    ) -> Result<RepositoryRecord, RepositoryError>;

    /// Returns every match in ascending id order.
    async fn find_repository_list(
        &self,
        find: &RepositoryFind,
    ) -> Result<Vec<RepositoryRecord>, RepositoryError>;

    /// Returns a single match, or `NotFound`.
    async fn find_repository(
        &self,
        find: &RepositoryFind,
    ) -> Result<RepositoryRecord, RepositoryError>;

    async fn patch_repository(
        &self,
        patch: &RepositoryPatch,
    ) -> Result<RepositoryRecord, RepositoryError>;

    /// Unlinks the project's repository and reverts the project to the UI workflow.
    async fn delete_repository(&self, delete: &RepositoryDelete) -> Result<(), RepositoryError>;
}
