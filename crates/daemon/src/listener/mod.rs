// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface under `/lw-workspace/`.
//!
//! Handlers only pull the user, token and query id out of the request and
//! forward to [`Hatchery`]; every decision is made there.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hatch_core::{AllPayModels, AppOption, PayModel, WorkspaceStatus};
use hatch_engine::{ErrorKind, Hatchery, HatcheryError, LaunchOutcome, TerminateOutcome};
use serde::Deserialize;

/// Set by the auth proxy in front of the daemon.
const REMOTE_USER: &str = "remote_user";

pub fn router(hatchery: Hatchery) -> Router {
    Router::new()
        .route("/lw-workspace/launch", post(launch).fallback(method_not_allowed))
        .route("/lw-workspace/terminate", post(terminate).fallback(method_not_allowed))
        .route("/lw-workspace/status", get(status).fallback(method_not_allowed))
        .route("/lw-workspace/options", get(options).fallback(method_not_allowed))
        .route("/lw-workspace/paymodels", get(paymodels).fallback(method_not_allowed))
        .route("/lw-workspace/setpaymodel", post(set_paymodel).fallback(method_not_allowed))
        .route("/lw-workspace/resetpaymodels", post(reset_paymodels).fallback(method_not_allowed))
        .route("/_status", get(health))
        .with_state(hatchery)
}

/// Plain-text error response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.to_string() }
    }
}

impl From<HatcheryError> for ApiError {
    fn from(err: HatcheryError) -> Self {
        let status = match err.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::Backend => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if err.kind() == ErrorKind::Backend {
            tracing::error!(error = %err, "request failed");
        } else {
            tracing::warn!(error = %err, "request rejected");
        }
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct IdParam {
    id: Option<String>,
}

impl IdParam {
    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|s| !s.is_empty())
    }
}

fn remote_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REMOTE_USER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

async fn launch(
    State(hatchery): State<Hatchery>,
    Query(param): Query<IdParam>,
    headers: HeaderMap,
) -> Result<&'static str, ApiError> {
    let id = param.id().ok_or_else(|| ApiError::bad_request("Missing ID argument"))?;
    let user = remote_user(&headers)
        .ok_or_else(|| ApiError::bad_request("No username found. Launch forbidden"))?;
    let token = bearer_token(&headers);
    match hatchery.launch(id, &user, token.as_deref()).await? {
        LaunchOutcome::Launched => Ok("Success"),
        LaunchOutcome::Accepted => Ok("Launch accepted"),
    }
}

async fn terminate(
    State(hatchery): State<Hatchery>,
    headers: HeaderMap,
) -> Result<&'static str, ApiError> {
    let user = remote_user(&headers)
        .ok_or_else(|| ApiError::bad_request("No username found. Unable to terminate"))?;
    match hatchery.terminate(&user).await? {
        TerminateOutcome::Kubernetes => Ok("Terminated workspace"),
        TerminateOutcome::Ecs(removed) => {
            tracing::info!(%user, %removed, "ECS workspace terminated");
            Ok("Terminated ECS workspace")
        }
    }
}

async fn status(
    State(hatchery): State<Hatchery>,
    headers: HeaderMap,
) -> Result<Json<WorkspaceStatus>, ApiError> {
    let user = remote_user(&headers)
        .ok_or_else(|| ApiError::bad_request("No username found. Unable to get status"))?;
    Ok(Json(hatchery.status(&user).await?))
}

async fn options(State(hatchery): State<Hatchery>) -> Json<Vec<AppOption>> {
    Json(hatchery.options())
}

async fn paymodels(
    State(hatchery): State<Hatchery>,
    headers: HeaderMap,
) -> Result<Json<AllPayModels>, ApiError> {
    let user = remote_user(&headers)
        .ok_or_else(|| ApiError::bad_request("No username found. Unable to get paymodels"))?;
    Ok(Json(hatchery.pay_models(&user).await?))
}

async fn set_paymodel(
    State(hatchery): State<Hatchery>,
    Query(param): Query<IdParam>,
    headers: HeaderMap,
) -> Result<Json<PayModel>, ApiError> {
    let id = param.id().ok_or_else(|| ApiError::bad_request("Missing ID argument"))?;
    let user = remote_user(&headers).unwrap_or_default();
    Ok(Json(hatchery.set_pay_model(&user, id).await?))
}

async fn reset_paymodels(
    State(hatchery): State<Hatchery>,
    headers: HeaderMap,
) -> Result<&'static str, ApiError> {
    let user = remote_user(&headers).unwrap_or_default();
    hatchery.reset_pay_models(&user).await?;
    Ok("Current Paymodel has been reset")
}

async fn health() -> &'static str {
    "Healthy"
}

async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
