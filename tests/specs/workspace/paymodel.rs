//! Pay-model specs
//!
//! The current pay model cannot change while a workspace exists.

use crate::prelude::*;

#[tokio::test]
async fn switch_is_refused_while_running() {
    let spec = Spec::new();
    spec.store.insert(PayModel::builder().id("ws-1").local(true).build());
    spec.post("/lw-workspace/launch?id=jupyter", "alice").await;

    let set = spec.post("/lw-workspace/setpaymodel?id=ws-1", "alice").await;
    let reset = spec.post("/lw-workspace/resetpaymodels", "alice").await;

    assert_eq!(set.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(set.body, "Can not update paymodel when workspace is running");
    assert_eq!(reset.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reset.body, "Can not reset paymodels when workspace is running");
    assert_eq!(spec.store.write_count(), 0);
}

#[tokio::test]
async fn switch_and_reset_when_idle() {
    let spec = Spec::new();
    spec.store.insert(PayModel::builder().id("ws-1").local(true).build());
    spec.store.insert(PayModel::builder().id("ws-2").current(false).build());

    let set = spec.post("/lw-workspace/setpaymodel?id=ws-2", "alice").await;
    assert_eq!(set.status, StatusCode::OK);
    assert_eq!(set.json()["bmh_workspace_id"], "ws-2");

    let listed = spec.get("/lw-workspace/paymodels", "alice").await;
    assert_eq!(listed.json()["current_pay_model"]["bmh_workspace_id"], "ws-2");

    let reset = spec.post("/lw-workspace/resetpaymodels", "alice").await;
    assert_eq!(reset.body, "Current Paymodel has been reset");
    assert!(spec.store.models("alice").iter().all(|m| !m.current));
}

#[tokio::test]
async fn unknown_pay_model_is_not_found() {
    let spec = Spec::new();
    spec.store.insert(PayModel::builder().id("ws-1").local(true).build());

    let reply = spec.post("/lw-workspace/setpaymodel?id=ws-9", "alice").await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}
