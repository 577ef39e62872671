//! # Authentication
//!
//! This module provides operator bearer authentication and caller identity
//! extraction (`X-Principal-Id`) for protected API endpoints.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::IntoParams;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized, validation_error};
use crate::server::AppState;

/// Header naming the principal on whose behalf the operator acts
pub const PRINCIPAL_HEADER: &str = "X-Principal-Id";

/// Principal ID wrapper for type safety
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrincipalId(pub i32);

/// Marker type for authenticated operator requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorAuth;

/// Extractor for the calling principal from request extensions
#[derive(Debug, Clone, Copy)]
pub struct PrincipalExtension(pub PrincipalId);

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Authentication middleware that validates bearer tokens and the principal header
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();

    let token = extract_bearer_token(headers)?;
    validate_token(&config, token)?;

    let principal = extract_principal_id(headers)?;
    tracing::debug!(principal_id = principal.0, "Authenticated operator request");

    request
        .extensions_mut()
        .insert(PrincipalExtension(principal));
    request.extensions_mut().insert(OperatorAuth);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

fn validate_token(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .operator_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into());

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn extract_principal_id(headers: &HeaderMap) -> Result<PrincipalId, ApiError> {
    let header_value = headers
        .get(PRINCIPAL_HEADER)
        .ok_or_else(|| {
            validation_error(
                "Missing required header",
                serde_json::json!({ PRINCIPAL_HEADER: "Required header is missing" }),
            )
        })?
        .to_str()
        .map_err(|_| {
            validation_error(
                "Invalid principal header",
                serde_json::json!({ PRINCIPAL_HEADER: "Header must be valid UTF-8" }),
            )
        })?;

    match header_value.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(PrincipalId(id)),
        _ => Err(validation_error(
            "Invalid principal ID",
            serde_json::json!({ PRINCIPAL_HEADER: "Must be a positive integer" }),
        )),
    }
}

/// OpenAPI header parameter for X-Principal-Id
#[derive(Debug, Serialize, Deserialize, IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Header)]
pub struct PrincipalHeader {
    /// Principal recorded as creator, updater or deleter of the change
    #[serde(rename = "X-Principal-Id")]
    #[param(rename = "X-Principal-Id", value_type = i32)]
    pub principal_id: i32,
}

impl<S> FromRequestParts<S> for PrincipalExtension
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PrincipalExtension>()
            .copied()
            .ok_or_else(|| {
                validation_error(
                    "Principal context missing",
                    serde_json::json!({ PRINCIPAL_HEADER: "Principal context not present" }),
                )
            })
    }
}

impl<S> FromRequestParts<S> for OperatorAuth
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OperatorAuth>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Operator authentication required")))
    }
}
