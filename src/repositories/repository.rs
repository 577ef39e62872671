//! Repository link store
//!
//! [`RepositoryStore`] implements [`RepositoryService`] over SeaORM. Every
//! write runs in a single transaction; returning early drops the transaction,
//! which rolls it back. Credentials are sealed with [`crate::crypto`] before
//! they reach the database and opened again on the way out.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::crypto::{CryptoKey, open_secret, repository_aad, seal_secret};
use crate::domain::{
    RepositoryCreate, RepositoryDelete, RepositoryFind, RepositoryPatch, RepositoryRecord,
    RepositoryService,
};
use crate::error::RepositoryError;
use crate::models::principal::Entity as Principal;
use crate::models::project::{Entity as Project, WorkflowType};
use crate::models::repository::{self, Entity as Repository};
use crate::models::vcs::Entity as Vcs;
use crate::repositories::project::set_workflow_type;

const ENTITY: &str = "repository";

/// SeaORM-backed [`RepositoryService`]
#[derive(Debug, Clone)]
pub struct RepositoryStore {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    crypto_key: CryptoKey,
}

impl RepositoryStore {
    /// Creates a new RepositoryStore instance
    pub fn new(db: Arc<DatabaseConnection>, crypto_key: CryptoKey) -> Self {
        Self { db, crypto_key }
    }

    fn seal(&self, aad: &str, secret: &str) -> Result<Vec<u8>, RepositoryError> {
        Ok(seal_secret(&self.crypto_key, aad, secret)?)
    }

    /// Opens the stored credentials of `model`.
    fn open_record(&self, model: repository::Model) -> Result<RepositoryRecord, RepositoryError> {
        let aad = repository_aad(model.vcs_id, model.project_id, &model.external_id);
        let open = |field: &'static str, ciphertext: &[u8]| {
            open_secret(&self.crypto_key, &aad, ciphertext).map_err(|e| {
                // Never log the ciphertext or the error detail
                tracing::error!(
                    repository_id = model.id,
                    project_id = model.project_id,
                    field,
                    "Credential decryption failed"
                );
                RepositoryError::from(e)
            })
        };

        let webhook_secret_token =
            open("webhook_secret_token", &model.webhook_secret_token_ciphertext)?;
        let access_token = open("access_token", &model.access_token_ciphertext)?;
        let refresh_token = open("refresh_token", &model.refresh_token_ciphertext)?;

        Ok(RepositoryRecord {
            id: model.id,
            creator_id: model.creator_id,
            created_ts: model.created_ts,
            updater_id: model.updater_id,
            updated_ts: model.updated_ts,
            vcs_id: model.vcs_id,
            project_id: model.project_id,
            name: model.name,
            full_path: model.full_path,
            web_url: model.web_url,
            branch_filter: model.branch_filter,
            base_directory: model.base_directory,
            file_path_template: model.file_path_template,
            schema_path_template: model.schema_path_template,
            external_id: model.external_id,
            external_webhook_id: model.external_webhook_id,
            webhook_url_host: model.webhook_url_host,
            webhook_endpoint_id: model.webhook_endpoint_id,
            webhook_secret_token,
            access_token,
            expires_ts: model.expires_ts,
            refresh_token,
        })
    }

    async fn query_models(
        &self,
        find: &RepositoryFind,
        limit: Option<u64>,
    ) -> Result<Vec<repository::Model>, RepositoryError> {
        let mut query = Repository::find()
            .filter(find_condition(find))
            .order_by_asc(repository::Column::Id);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        Ok(query.all(&*self.db).await?)
    }
}

fn find_condition(find: &RepositoryFind) -> Condition {
    let mut condition = Condition::all();
    if let Some(id) = find.id {
        condition = condition.add(repository::Column::Id.eq(id));
    }
    if let Some(vcs_id) = find.vcs_id {
        condition = condition.add(repository::Column::VcsId.eq(vcs_id));
    }
    if let Some(project_id) = find.project_id {
        condition = condition.add(repository::Column::ProjectId.eq(project_id));
    }
    if let Some(ref webhook_endpoint_id) = find.webhook_endpoint_id {
        condition =
            condition.add(repository::Column::WebhookEndpointId.eq(webhook_endpoint_id.as_str()));
    }
    condition
}

async fn ensure_principal<C: ConnectionTrait>(
    conn: &C,
    field: &'static str,
    id: i32,
) -> Result<(), RepositoryError> {
    match Principal::find_by_id(id).one(conn).await? {
        Some(_) => Ok(()),
        None => Err(RepositoryError::ReferenceInvalid { field, id }),
    }
}

fn now_ts() -> i64 {
    Utc::now().timestamp()
}

#[async_trait]
impl RepositoryService for RepositoryStore {
    async fn create_repository(
        &self,
        create: &RepositoryCreate,
    ) -> Result<RepositoryRecord, RepositoryError> {
        create.validate()?;

        let txn = self.db.begin().await?;

        if Vcs::find_by_id(create.vcs_id).one(&txn).await?.is_none() {
            return Err(RepositoryError::ReferenceInvalid {
                field: "vcs_id",
                id: create.vcs_id,
            });
        }
        let project = Project::find_by_id(create.project_id)
            .one(&txn)
            .await?
            .ok_or(RepositoryError::ReferenceInvalid {
                field: "project_id",
                id: create.project_id,
            })?;
        ensure_principal(&txn, "creator_id", create.creator_id).await?;

        let linked = Repository::find()
            .filter(repository::Column::ProjectId.eq(create.project_id))
            .one(&txn)
            .await?;
        if let Some(existing) = linked {
            return Err(RepositoryError::conflict(format!(
                "project {} is already linked to repository {}",
                create.project_id, existing.id
            )));
        }

        // Empty endpoint ids are allowed to repeat
        if !create.webhook_endpoint_id.is_empty() {
            let taken = Repository::find()
                .filter(repository::Column::WebhookEndpointId.eq(create.webhook_endpoint_id.as_str()))
                .one(&txn)
                .await?;
            if taken.is_some() {
                return Err(RepositoryError::conflict(format!(
                    "webhook endpoint '{}' is already in use",
                    create.webhook_endpoint_id
                )));
            }
        }

        let aad = repository_aad(create.vcs_id, create.project_id, &create.external_id);
        let now = now_ts();

        let active = repository::ActiveModel {
            creator_id: Set(create.creator_id),
            created_ts: Set(now),
            updater_id: Set(create.creator_id),
            updated_ts: Set(now),
            vcs_id: Set(create.vcs_id),
            project_id: Set(create.project_id),
            name: Set(create.name.clone()),
            full_path: Set(create.full_path.clone()),
            web_url: Set(create.web_url.clone()),
            branch_filter: Set(create.branch_filter.clone()),
            base_directory: Set(create.base_directory.clone()),
            file_path_template: Set(create.file_path_template.clone()),
            schema_path_template: Set(create.schema_path_template.clone()),
            external_id: Set(create.external_id.clone()),
            external_webhook_id: Set(create.external_webhook_id.clone()),
            webhook_url_host: Set(create.webhook_url_host.clone()),
            webhook_endpoint_id: Set(create.webhook_endpoint_id.clone()),
            webhook_secret_token_ciphertext: Set(self.seal(&aad, &create.webhook_secret_token)?),
            access_token_ciphertext: Set(self.seal(&aad, &create.access_token)?),
            expires_ts: Set(create.expires_ts),
            refresh_token_ciphertext: Set(self.seal(&aad, &create.refresh_token)?),
            ..Default::default()
        };

        let model = active.insert(&txn).await?;
        set_workflow_type(&txn, project, WorkflowType::Vcs, create.creator_id, now).await?;
        txn.commit().await?;

        tracing::info!(
            repository_id = model.id,
            project_id = model.project_id,
            vcs_id = model.vcs_id,
            creator_id = model.creator_id,
            "Linked repository to project"
        );

        self.open_record(model)
    }

    async fn find_repository_list(
        &self,
        find: &RepositoryFind,
    ) -> Result<Vec<RepositoryRecord>, RepositoryError> {
        let models = self.query_models(find, None).await?;
        tracing::debug!(filter = %find, count = models.len(), "Listed repositories");

        models
            .into_iter()
            .map(|model| self.open_record(model))
            .collect()
    }

    async fn find_repository(
        &self,
        find: &RepositoryFind,
    ) -> Result<RepositoryRecord, RepositoryError> {
        let mut models = self.query_models(find, Some(2)).await?;

        if models.len() > 1 {
            tracing::warn!(
                filter = %find,
                "Single repository lookup matched several rows, returning the lowest id"
            );
        }

        if models.is_empty() {
            return Err(RepositoryError::not_found(ENTITY, find));
        }
        self.open_record(models.swap_remove(0))
    }

    async fn patch_repository(
        &self,
        patch: &RepositoryPatch,
    ) -> Result<RepositoryRecord, RepositoryError> {
        patch.validate()?;

        let txn = self.db.begin().await?;

        let model = Repository::find_by_id(patch.id)
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found(ENTITY, RepositoryFind::by_id(patch.id)))?;
        ensure_principal(&txn, "updater_id", patch.updater_id).await?;

        let aad = repository_aad(model.vcs_id, model.project_id, &model.external_id);
        let mut active = model.into_active_model();

        active.updater_id = Set(patch.updater_id);
        active.updated_ts = Set(now_ts());

        if let Some(ref branch_filter) = patch.branch_filter {
            active.branch_filter = Set(branch_filter.clone());
        }
        if let Some(ref base_directory) = patch.base_directory {
            active.base_directory = Set(base_directory.clone());
        }
        if let Some(ref file_path_template) = patch.file_path_template {
            active.file_path_template = Set(file_path_template.clone());
        }
        if let Some(ref schema_path_template) = patch.schema_path_template {
            active.schema_path_template = Set(schema_path_template.clone());
        }
        if let Some(ref access_token) = patch.access_token {
            active.access_token_ciphertext = Set(self.seal(&aad, access_token)?);
        }
        if let Some(expires_ts) = patch.expires_ts {
            active.expires_ts = Set(expires_ts);
        }
        if let Some(ref refresh_token) = patch.refresh_token {
            active.refresh_token_ciphertext = Set(self.seal(&aad, refresh_token)?);
        }

        let model = active.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            repository_id = model.id,
            updater_id = patch.updater_id,
            audit_only = patch.is_audit_only(),
            credentials_rotated = patch.access_token.is_some() || patch.refresh_token.is_some(),
            "Patched repository"
        );

        self.open_record(model)
    }

    async fn delete_repository(&self, delete: &RepositoryDelete) -> Result<(), RepositoryError> {
        delete.validate()?;

        let txn = self.db.begin().await?;

        let model = Repository::find()
            .filter(repository::Column::ProjectId.eq(delete.project_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                RepositoryError::not_found(ENTITY, RepositoryFind::by_project(delete.project_id))
            })?;
        ensure_principal(&txn, "deleter_id", delete.deleter_id).await?;

        let result = Repository::delete_by_id(model.id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(
                ENTITY,
                RepositoryFind::by_project(delete.project_id),
            ));
        }

        if let Some(project) = Project::find_by_id(delete.project_id).one(&txn).await? {
            set_workflow_type(&txn, project, WorkflowType::Ui, delete.deleter_id, now_ts())
                .await?;
        }
        txn.commit().await?;

        tracing::info!(
            repository_id = model.id,
            project_id = delete.project_id,
            deleter_id = delete.deleter_id,
            "Unlinked repository from project"
        );

        Ok(())
    }
}
