//! Status specs
//!
//! Status is read fresh from the routed backend on every request.

use crate::prelude::*;

#[tokio::test]
async fn unknown_user_has_no_workspace() {
    let spec = Spec::new();

    let reply = spec.get("/lw-workspace/status", "test_user").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, r#"{"status":"Not Found"}"#);
    assert_eq!(spec.local.calls(), vec![K8sCall::GetPod("hatchery-test-5fuser".to_string())]);
}

#[tokio::test]
async fn launched_workspace_reports_launching_snapshot() {
    let spec = Spec::new();
    spec.post("/lw-workspace/launch?id=jupyter", "alice").await;

    let reply = spec.get("/lw-workspace/status", "alice").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["status"], "Launching");
}

#[tokio::test]
async fn ecs_pay_model_reads_ecs_status() {
    let spec = Spec::new();
    spec.store.insert(PayModel::builder().ecs(true).build());
    spec.ecs.set_status(Status::Running);

    let reply = spec.get("/lw-workspace/status", "alice").await;

    assert_eq!(reply.body, r#"{"status":"Running"}"#);
    assert!(spec.local.calls().is_empty());
}
