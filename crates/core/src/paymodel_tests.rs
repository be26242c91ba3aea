// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    ecs = { true, false, BackendKind::Ecs },
    ecs_wins_over_local = { true, true, BackendKind::Ecs },
    local = { false, true, BackendKind::LocalK8s },
    external = { false, false, BackendKind::ExternalK8s },
)]
fn backend_selection(ecs: bool, local: bool, expected: BackendKind) {
    let pm = PayModel::builder().ecs(ecs).local(local).build();
    assert_eq!(pm.backend(), expected);
}

#[parameterized(
    active = { "active", true },
    pending = { "pending", false },
    capitalized = { "Active", false },
    empty = { "", false },
)]
fn activation(status: &str, expected: bool) {
    assert_eq!(PayModel::builder().status(status).build().is_active(), expected);
}

#[test]
fn serializes_store_field_names() {
    let pm = PayModel::builder().id("ws-9").ecs(true).subnet(3).build();
    let value = serde_json::to_value(&pm).unwrap();
    assert_eq!(value["bmh_workspace_id"], "ws-9");
    assert_eq!(value["workspace_type"], "Direct Pay");
    assert_eq!(value["account_id"], "123456789012");
    assert_eq!(value["request_status"], "active");
    assert_eq!(value["ecs"], true);
    assert_eq!(value["subnet"], 3);
    assert_eq!(value["current_pay_model"], true);
    assert!(value.get("hard-limit").is_some());
}

#[test]
fn current_is_split_out() {
    let models = vec![
        PayModel::builder().id("a").current(false).build(),
        PayModel::builder().id("b").current(true).build(),
    ];
    let all = AllPayModels::from_models(models);
    assert_eq!(all.current_pay_model.map(|m| m.id), Some("b".to_string()));
    assert_eq!(all.all_pay_models.len(), 2);
}

#[test]
fn no_current_when_none_flagged() {
    let all = AllPayModels::from_models(vec![PayModel::builder().current(false).build()]);
    assert_eq!(all.current_pay_model, None);
}

#[parameterized(
    local = { BackendKind::LocalK8s, "local-k8s" },
    external = { BackendKind::ExternalK8s, "external-k8s" },
    ecs = { BackendKind::Ecs, "ecs" },
)]
fn backend_kind_display(kind: BackendKind, expected: &str) {
    assert_eq!(kind.to_string(), expected);
}
