// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::Body;
use axum::http::{Method, Request};
use hatch_adapters::{FakeEcsBackend, FakeK8sBackend, FakePayModelStore, K8sBackend};
use hatch_core::test_support;
use hatch_engine::HatcheryDeps;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use yare::parameterized;

struct TestApp {
    router: Router,
    k8s: FakeK8sBackend,
    store: FakePayModelStore,
}

fn app() -> TestApp {
    let k8s = FakeK8sBackend::new();
    let store = FakePayModelStore::new();
    let deps = HatcheryDeps {
        local: Arc::new(k8s.clone()) as Arc<dyn K8sBackend>,
        external: HashMap::new(),
        pay_models: Arc::new(store.clone()),
        ecs: Arc::new(FakeEcsBackend::new()),
    };
    let hatchery = Hatchery::new(Arc::new(test_support::config()), deps).unwrap();
    TestApp { router: router(hatchery), k8s, store }
}

async fn send(router: &Router, method: Method, uri: &str, user: Option<&str>) -> (StatusCode, String) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header("REMOTE_USER", user);
    }
    let response = router.clone().oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn health_check() {
    let app = app();
    assert_eq!(send(&app.router, Method::GET, "/_status", None).await, (StatusCode::OK, "Healthy".to_string()));
}

#[parameterized(
    launch = { "GET", "/lw-workspace/launch?id=jupyter" },
    terminate = { "GET", "/lw-workspace/terminate" },
    status = { "POST", "/lw-workspace/status" },
    options = { "DELETE", "/lw-workspace/options" },
    paymodels = { "POST", "/lw-workspace/paymodels" },
    setpaymodel = { "GET", "/lw-workspace/setpaymodel?id=x" },
    resetpaymodels = { "PUT", "/lw-workspace/resetpaymodels" },
)]
#[test_macro(tokio::test)]
async fn wrong_method_is_405(method: &str, uri: &str) {
    let app = app();
    let method = Method::from_bytes(method.as_bytes()).unwrap();
    let (status, body) = send(&app.router, method, uri, Some("alice")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, "Method Not Allowed");
    assert!(app.k8s.calls().is_empty());
}

#[parameterized(
    launch_no_id = { "/lw-workspace/launch", Some("alice"), "Missing ID argument" },
    launch_empty_id = { "/lw-workspace/launch?id=", Some("alice"), "Missing ID argument" },
    launch_no_user = { "/lw-workspace/launch?id=jupyter", None, "No username found. Launch forbidden" },
    terminate_no_user = { "/lw-workspace/terminate", None, "No username found. Unable to terminate" },
    setpaymodel_no_id = { "/lw-workspace/setpaymodel", Some("alice"), "Missing ID argument" },
)]
#[test_macro(tokio::test)]
async fn missing_arguments_are_400(uri: &str, user: Option<&str>, message: &str) {
    let app = app();
    let (status, body) = send(&app.router, Method::POST, uri, user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message);
    assert!(app.k8s.calls().is_empty());
}

#[tokio::test]
async fn status_requires_user() {
    let app = app();
    let (status, body) = send(&app.router, Method::GET, "/lw-workspace/status", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "No username found. Unable to get status");
}

#[tokio::test]
async fn unknown_app_is_400() {
    let app = app();
    let (status, body) =
        send(&app.router, Method::POST, "/lw-workspace/launch?id=nope", Some("alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Container nope not found");
}

#[tokio::test]
async fn launch_then_status_then_terminate() {
    let app = app();

    let (status, body) =
        send(&app.router, Method::POST, "/lw-workspace/launch?id=jupyter", Some("alice")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "Success"));

    let (status, body) = send(&app.router, Method::GET, "/lw-workspace/status", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "Launching");

    let (status, body) =
        send(&app.router, Method::POST, "/lw-workspace/launch?id=jupyter", Some("alice")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Workspace is already running. Launch forbidden");

    let (status, body) = send(&app.router, Method::POST, "/lw-workspace/terminate", Some("alice")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "Terminated workspace"));
}

#[tokio::test]
async fn terminate_without_workspace_is_404() {
    let app = app();
    let (status, body) = send(&app.router, Method::POST, "/lw-workspace/terminate", Some("alice")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "A workspace pod was not found");
}

#[tokio::test]
async fn options_lists_configured_apps() {
    let app = app();
    let (status, body) = send(&app.router, Method::GET, "/lw-workspace/options", None).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json[0]["id"], "jupyter");
    assert_eq!(json[0]["cpu-limit"], "1");
    assert_eq!(json[0]["memory-limit"], "1Gi");
}

#[tokio::test]
async fn paymodels_not_found_is_404() {
    let app = app();
    let (status, body) = send(&app.router, Method::GET, "/lw-workspace/paymodels", Some("alice")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Pay model data not found");
}

#[tokio::test]
async fn paymodels_lists_current_and_all() {
    let app = app();
    app.store.insert(PayModel::builder().id("ws-1").local(true).build());
    let (status, body) = send(&app.router, Method::GET, "/lw-workspace/paymodels", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["current_pay_model"]["bmh_workspace_id"], "ws-1");
    assert_eq!(json["all_pay_models"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn setpaymodel_returns_chosen_model() {
    let app = app();
    app.store.insert(PayModel::builder().id("ws-1").local(true).current(false).build());
    let (status, body) =
        send(&app.router, Method::POST, "/lw-workspace/setpaymodel?id=ws-1", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["bmh_workspace_id"], "ws-1");
    assert_eq!(json["current_pay_model"], true);
}

#[tokio::test]
async fn pay_model_changes_rejected_while_running() {
    let app = app();
    send(&app.router, Method::POST, "/lw-workspace/launch?id=jupyter", Some("alice")).await;

    let (status, body) =
        send(&app.router, Method::POST, "/lw-workspace/setpaymodel?id=ws-1", Some("alice")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Can not update paymodel when workspace is running");

    let (status, body) = send(&app.router, Method::POST, "/lw-workspace/resetpaymodels", Some("alice")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Can not reset paymodels when workspace is running");
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn resetpaymodels_without_user_acts_on_nobody() {
    let app = app();
    let (status, body) = send(&app.router, Method::POST, "/lw-workspace/resetpaymodels", None).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "Current Paymodel has been reset"));
    assert_eq!(app.store.calls().last(), Some(&hatch_adapters::PayModelCall::ResetCurrent(String::new())));
}

#[test]
fn bearer_token_is_extracted() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer_token(&headers), None);
    headers.insert("authorization", "Bearer abc.def".parse().unwrap());
    assert_eq!(bearer_token(&headers), Some("abc.def".to_string()));
    headers.insert("authorization", "Basic xyz".parse().unwrap());
    assert_eq!(bearer_token(&headers), None);
}
