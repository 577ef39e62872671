//! # Tests for Handlers
//!
//! This module contains unit tests for API handlers and their request and
//! response types.

use crate::domain::{RepositoryFind, RepositoryRecord};
use crate::handlers::repositories::{
    CreateRepositoryRequest, ListRepositoriesQuery, PatchRepositoryRequest, RepositoryResponse,
};
use crate::handlers::root;
use crate::models::ServiceInfo;
use axum::response::Json;
use serde_json::{Value, json};

fn record_with_secrets() -> RepositoryRecord {
    RepositoryRecord {
        id: 7,
        creator_id: 101,
        created_ts: 1_700_000_000,
        updater_id: 101,
        updated_ts: 1_700_000_000,
        vcs_id: 1,
        project_id: 5,
        name: "app".to_string(),
        full_path: "org/app".to_string(),
        web_url: "https://gitlab.example.com/org/app".to_string(),
        branch_filter: "main".to_string(),
        base_directory: "migrations".to_string(),
        file_path_template: "{{DB_NAME}}__{{VERSION}}.sql".to_string(),
        schema_path_template: String::new(),
        external_id: "42".to_string(),
        external_webhook_id: "hook-9001".to_string(),
        webhook_url_host: "https://hooks.example.com".to_string(),
        webhook_endpoint_id: "endpoint-secret-id".to_string(),
        webhook_secret_token: "whsec-value".to_string(),
        access_token: "glpat-access".to_string(),
        expires_ts: 1_800_000_000,
        refresh_token: String::new(),
    }
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "vcs-link");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_handler_returns_valid_json() {
    let Json(service_info) = root().await;

    let json_value: Value =
        serde_json::to_value(&service_info).expect("Failed to serialize ServiceInfo");

    assert_eq!(json_value["service"], "vcs-link");
    assert!(json_value.get("version").is_some());
}

#[test]
fn test_service_info_default() {
    let service_info = ServiceInfo::default();

    assert_eq!(service_info.service, "vcs-link");
    assert!(!service_info.version.is_empty());
}

#[test]
fn test_repository_response_hides_credentials() {
    let response = RepositoryResponse::from(record_with_secrets().to_view());
    let serialized = serde_json::to_string(&response).expect("serializes");

    for secret in [
        "glpat-access",
        "whsec-value",
        "endpoint-secret-id",
        "hook-9001",
        "hooks.example.com",
    ] {
        assert!(!serialized.contains(secret), "leaked {secret}");
    }

    assert!(response.has_access_token);
    assert!(!response.has_refresh_token);
    assert_eq!(response.full_path, "org/app");
    assert_eq!(response.external_id, "42");
}

#[test]
fn test_repository_response_field_names() {
    let value = serde_json::to_value(RepositoryResponse::from(record_with_secrets().to_view()))
        .expect("serializes");

    let object = value.as_object().expect("object");
    assert!(object.contains_key("project_id"));
    assert!(object.contains_key("has_access_token"));
    assert!(!object.contains_key("access_token"));
    assert!(!object.contains_key("expires_ts"));
    assert_eq!(object["creator"], Value::Null);
}

#[test]
fn test_create_request_defaults_optional_fields() {
    let request: CreateRepositoryRequest = serde_json::from_value(json!({
        "vcs_id": 1,
        "name": "app",
        "full_path": "org/app",
        // Ignored: the creator comes from the authenticated principal
        "creator_id": 999
    }))
    .expect("deserializes");

    assert_eq!(request.vcs_id, 1);
    assert_eq!(request.web_url, "");
    assert_eq!(request.expires_ts, 0);
    assert_eq!(request.access_token, "");
}

#[test]
fn test_create_request_requires_core_fields() {
    let result = serde_json::from_value::<CreateRepositoryRequest>(json!({
        "name": "app",
        "full_path": "org/app"
    }));
    assert!(result.is_err());
}

#[test]
fn test_patch_request_distinguishes_absent_fields() {
    let request: PatchRepositoryRequest = serde_json::from_value(json!({
        "branch_filter": "",
        "expires_ts": 0
    }))
    .expect("deserializes");

    assert_eq!(request.branch_filter.as_deref(), Some(""));
    assert_eq!(request.expires_ts, Some(0));
    assert!(request.access_token.is_none());
    assert!(request.base_directory.is_none());
}

#[test]
fn test_patch_request_rejects_immutable_fields() {
    for body in [
        json!({ "name": "x" }),
        json!({ "vcs_id": 2 }),
        json!({ "webhook_endpoint_id": "ep" }),
    ] {
        let result = serde_json::from_value::<PatchRepositoryRequest>(body.clone());
        assert!(result.is_err(), "accepted {body}");
    }
}

#[test]
fn test_list_query_maps_to_find() {
    let find = RepositoryFind::from(ListRepositoriesQuery {
        vcs_id: Some(1),
        project_id: None,
        webhook_endpoint_id: Some("ep-1".to_string()),
    });

    assert_eq!(find.id, None);
    assert_eq!(find.vcs_id, Some(1));
    assert_eq!(find.project_id, None);
    assert_eq!(find.webhook_endpoint_id.as_deref(), Some("ep-1"));
    assert_eq!(
        RepositoryFind::from(ListRepositoriesQuery::default()),
        RepositoryFind::default()
    );
}
