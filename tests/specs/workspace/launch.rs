//! Launch specs
//!
//! Launch routes by the user's current pay model and refuses double launches.

use crate::prelude::*;

#[tokio::test]
async fn launch_without_pay_model_creates_pod_and_service() {
    let spec = Spec::new();

    let reply = spec.post("/lw-workspace/launch?id=jupyter", "alice").await;

    assert_eq!((reply.status, reply.body.as_str()), (StatusCode::OK, "Success"));
    assert_eq!(spec.local.pod_names(), vec!["hatchery-alice".to_string()]);
    assert!(spec.local.service("h-alice-s").is_some());
    assert!(spec.local.mapping("alice-mapping").is_some());
    let creates = spec.local.calls().into_iter().filter(|c| matches!(c, K8sCall::CreatePod(_))).count();
    assert_eq!(creates, 1);
}

#[tokio::test]
async fn launch_by_explicit_id() {
    let app = Container::builder().name("Foo Notebook").id("foo").build();
    let spec = Spec::with_config(test_support::config_with(vec![app]));

    let reply = spec.post("/lw-workspace/launch?id=foo", "alice").await;

    assert_eq!((reply.status, reply.body.as_str()), (StatusCode::OK, "Success"));
    assert!(spec.local.pod("hatchery-alice").is_some());
    assert!(spec.local.service("h-alice-s").is_some());
}

#[tokio::test]
async fn unknown_app_is_rejected() {
    let spec = Spec::new();
    let reply = spec.post("/lw-workspace/launch?id=foo", "alice").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body, "Container foo not found");
    assert!(spec.local.pod_names().is_empty());
}

#[tokio::test]
async fn relaunch_is_forbidden_while_running() {
    let spec = Spec::new();
    spec.post("/lw-workspace/launch?id=jupyter", "alice").await;

    let reply = spec.post("/lw-workspace/launch?id=jupyter", "alice").await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body, "Workspace is already running. Launch forbidden");
}

#[tokio::test]
async fn external_pay_model_launches_on_account_cluster() {
    let spec = Spec::new();
    spec.store.insert(PayModel::builder().build());

    let reply = spec.post("/lw-workspace/launch?id=jupyter", "alice").await;

    assert_eq!(reply.body, "Success");
    assert!(spec.local.pod_names().is_empty());
    assert_eq!(spec.external.pod_names(), vec!["hatchery-alice".to_string()]);
}

#[tokio::test]
async fn active_ecs_launch_is_accepted_in_background() {
    let spec = Spec::new();
    spec.store.insert(PayModel::builder().ecs(true).build());
    spec.ecs.hold_launches();

    let reply = spec.post("/lw-workspace/launch?id=jupyter", "alice").await;

    assert_eq!((reply.status, reply.body.as_str()), (StatusCode::OK, "Launch accepted"));
    assert!(!spec.ecs.calls().contains(&EcsCall::LaunchFinished { user: "alice".to_string() }));

    spec.ecs.release_launch();
    spec.settle().await;
    assert!(spec.ecs.calls().contains(&EcsCall::LaunchFinished { user: "alice".to_string() }));
    assert!(spec.local.calls().is_empty());
}

#[tokio::test]
async fn inactive_ecs_pay_model_is_forbidden() {
    let spec = Spec::new();
    spec.store.insert(PayModel::builder().ecs(true).status("expired").build());

    let reply = spec.post("/lw-workspace/launch?id=jupyter", "alice").await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body, "Paymodel is not active. Launch forbidden");
    assert!(spec.ecs.calls().is_empty());
}
