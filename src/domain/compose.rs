//! Relation attachment for repository views.

use async_trait::async_trait;

use super::repository::{RepositoryRecord, RepositoryView};
use crate::error::RepositoryError;
use crate::models::{principal, project, vcs};

/// Read-only access to the entities a repository link refers to.
#[async_trait]
pub trait RelationLookup: Send + Sync {
    async fn find_principal(&self, id: i32) -> Result<Option<principal::Model>, RepositoryError>;
    async fn find_vcs(&self, id: i32) -> Result<Option<vcs::Model>, RepositoryError>;
    async fn find_project(&self, id: i32) -> Result<Option<project::Model>, RepositoryError>;
}

/// Converts `record` and resolves its creator, updater, VCS and project.
///
/// Relations that no longer resolve are left as `None`; lookup failures
/// propagate.
pub async fn compose_repository(
    record: &RepositoryRecord,
    lookup: &dyn RelationLookup,
) -> Result<RepositoryView, RepositoryError> {
    let mut view = record.to_view();

    view.creator = lookup.find_principal(record.creator_id).await?;
    view.updater = if record.updater_id == record.creator_id {
        view.creator.clone()
    } else {
        lookup.find_principal(record.updater_id).await?
    };
    view.vcs = lookup.find_vcs(record.vcs_id).await?;
    view.project = lookup.find_project(record.project_id).await?;

    Ok(view)
}

/// Composes each record in order.
pub async fn compose_repository_list(
    records: &[RepositoryRecord],
    lookup: &dyn RelationLookup,
) -> Result<Vec<RepositoryView>, RepositoryError> {
    let mut views = Vec::with_capacity(records.len());
    for record in records {
        views.push(compose_repository(record, lookup).await?);
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MapLookup {
        principals: HashMap<i32, principal::Model>,
        vcs: HashMap<i32, vcs::Model>,
        projects: HashMap<i32, project::Model>,
        principal_calls: AtomicUsize,
    }

    #[async_trait]
    impl RelationLookup for MapLookup {
        async fn find_principal(
            &self,
            id: i32,
        ) -> Result<Option<principal::Model>, RepositoryError> {
            self.principal_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.principals.get(&id).cloned())
        }

        async fn find_vcs(&self, id: i32) -> Result<Option<vcs::Model>, RepositoryError> {
            Ok(self.vcs.get(&id).cloned())
        }

        async fn find_project(&self, id: i32) -> Result<Option<project::Model>, RepositoryError> {
            Ok(self.projects.get(&id).cloned())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl RelationLookup for FailingLookup {
        async fn find_principal(&self, _: i32) -> Result<Option<principal::Model>, RepositoryError> {
            Err(RepositoryError::Database(sea_orm::DbErr::Custom(
                "lookup offline".to_string(),
            )))
        }

        async fn find_vcs(&self, _: i32) -> Result<Option<vcs::Model>, RepositoryError> {
            Ok(None)
        }

        async fn find_project(&self, _: i32) -> Result<Option<project::Model>, RepositoryError> {
            Ok(None)
        }
    }

    fn principal(id: i32, name: &str) -> principal::Model {
        principal::Model {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name),
            created_ts: 0,
            updated_ts: 0,
        }
    }

    fn record(creator_id: i32, updater_id: i32) -> RepositoryRecord {
        RepositoryRecord {
            id: 3,
            creator_id,
            created_ts: 10,
            updater_id,
            updated_ts: 20,
            vcs_id: 1,
            project_id: 5,
            name: "app".to_string(),
            full_path: "org/app".to_string(),
            web_url: String::new(),
            branch_filter: String::new(),
            base_directory: String::new(),
            file_path_template: String::new(),
            schema_path_template: String::new(),
            external_id: "42".to_string(),
            external_webhook_id: String::new(),
            webhook_url_host: String::new(),
            webhook_endpoint_id: String::new(),
            webhook_secret_token: String::new(),
            access_token: String::new(),
            expires_ts: 0,
            refresh_token: String::new(),
        }
    }

    fn lookup() -> MapLookup {
        let mut lookup = MapLookup::default();
        lookup.principals.insert(101, principal(101, "ada"));
        lookup.principals.insert(102, principal(102, "grace"));
        lookup.vcs.insert(
            1,
            vcs::Model {
                id: 1,
                name: "GitLab".to_string(),
                vcs_type: vcs::VcsType::GitlabSelfHost,
                instance_url: "https://gitlab.example.com".to_string(),
                application_id: "app-id".to_string(),
                created_ts: 0,
                updated_ts: 0,
            },
        );
        lookup.projects.insert(
            5,
            project::Model {
                id: 5,
                name: "Payments".to_string(),
                key: "PAY".to_string(),
                workflow_type: project::WorkflowType::Vcs,
                creator_id: 101,
                created_ts: 0,
                updater_id: 101,
                updated_ts: 0,
            },
        );
        lookup
    }

    #[tokio::test]
    async fn test_compose_resolves_all_relations() {
        let lookup = lookup();
        let view = compose_repository(&record(101, 102), &lookup)
            .await
            .expect("compose succeeds");

        assert_eq!(view.creator.as_ref().map(|p| p.name.as_str()), Some("ada"));
        assert_eq!(view.updater.as_ref().map(|p| p.name.as_str()), Some("grace"));
        assert_eq!(view.vcs.as_ref().map(|v| v.id), Some(1));
        assert_eq!(view.project.as_ref().map(|p| p.key.as_str()), Some("PAY"));
        assert_eq!(view.creator_id, 101);
        assert_eq!(view.updater_id, 102);
    }

    #[tokio::test]
    async fn test_compose_reuses_creator_for_same_updater() {
        let lookup = lookup();
        let view = compose_repository(&record(101, 101), &lookup)
            .await
            .expect("compose succeeds");

        assert_eq!(view.creator, view.updater);
        assert_eq!(lookup.principal_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_compose_leaves_missing_relations_unset() {
        let lookup = MapLookup::default();
        let view = compose_repository(&record(101, 102), &lookup)
            .await
            .expect("compose succeeds");

        assert!(view.creator.is_none());
        assert!(view.updater.is_none());
        assert!(view.vcs.is_none());
        assert!(view.project.is_none());
        assert_eq!(view.vcs_id, 1);
        assert_eq!(view.project_id, 5);
    }

    #[tokio::test]
    async fn test_compose_propagates_lookup_failure() {
        let result = compose_repository(&record(101, 102), &FailingLookup).await;
        assert!(matches!(result, Err(RepositoryError::Database(_))));
    }

    #[tokio::test]
    async fn test_compose_list_keeps_order() {
        let lookup = lookup();
        let mut second = record(102, 102);
        second.id = 4;

        let views = compose_repository_list(&[record(101, 101), second], &lookup)
            .await
            .expect("compose succeeds");

        assert_eq!(views.iter().map(|v| v.id).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(
            views[1].creator.as_ref().map(|p| p.name.as_str()),
            Some("grace")
        );
    }
}
