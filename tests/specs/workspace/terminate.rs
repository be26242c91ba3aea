//! Terminate specs
//!
//! Terminate returns once deletion is accepted; the pay model is reset only
//! after the workspace is observed gone.

use crate::prelude::*;

#[tokio::test]
async fn terminate_resets_pay_model_after_teardown() {
    let spec = Spec::new();
    spec.store.insert(PayModel::builder().local(true).build());
    spec.post("/lw-workspace/launch?id=jupyter", "alice").await;

    let reply = spec.post("/lw-workspace/terminate", "alice").await;
    assert_eq!((reply.status, reply.body.as_str()), (StatusCode::OK, "Terminated workspace"));

    spec.settle().await;
    assert_eq!(spec.store.reset_count(), 1);
    assert!(spec.store.models("alice").iter().all(|m| !m.current));
    assert!(spec.local.pod_names().is_empty());
}

#[tokio::test]
async fn terminate_deletes_with_grace_period() {
    let spec = Spec::new();
    spec.post("/lw-workspace/launch?id=jupyter", "alice").await;

    spec.post("/lw-workspace/terminate", "alice").await;

    assert!(spec.local.calls().contains(&K8sCall::DeletePod {
        name: "hatchery-alice".to_string(),
        grace_seconds: Some(20),
    }));
}

#[tokio::test]
async fn terminate_of_missing_workspace_is_not_found() {
    let spec = Spec::new();

    let reply = spec.post("/lw-workspace/terminate", "alice").await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, "A workspace pod was not found");
    assert!(spec.hatchery.tasks().is_empty());
}

#[tokio::test]
async fn ecs_terminate_reports_ecs_path() {
    let spec = Spec::new();
    spec.store.insert(PayModel::builder().ecs(true).build());
    spec.ecs.script_statuses([Status::Terminating, Status::NotFound]);

    let reply = spec.post("/lw-workspace/terminate", "alice").await;

    assert_eq!((reply.status, reply.body.as_str()), (StatusCode::OK, "Terminated ECS workspace"));
    spec.settle().await;
    assert_eq!(spec.store.reset_count(), 1);
}
