// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::k8s::{FakeK8sBackend, K8sCall};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

fn service(name: &str) -> Service {
    Service {
        metadata: ObjectMeta { name: Some(name.to_string()), ..Default::default() },
        ..Default::default()
    }
}

#[test]
fn missing_config_is_an_error() {
    let err = ServiceMapper::from_config(None).unwrap_err();
    assert_eq!(err.to_string(), "Service mapper not found");
}

#[test]
fn config_selects_flavour() {
    let v1 = ServiceMapperConfig::AmbassadorV1(MapperSettings::default());
    assert!(matches!(ServiceMapper::from_config(Some(&v1)), Ok(ServiceMapper::AmbassadorV1(_))));
    let v2 = ServiceMapperConfig::AmbassadorV2(MapperSettings::default());
    assert!(matches!(ServiceMapper::from_config(Some(&v2)), Ok(ServiceMapper::AmbassadorV2(_))));
}

fn v1_document(svc: &Service) -> serde_yaml::Value {
    let doc = &svc.metadata.annotations.as_ref().unwrap()[V1_ANNOTATION];
    assert!(doc.starts_with("---\n"));
    serde_yaml::from_str(doc).unwrap()
}

#[tokio::test]
async fn v1_annotates_service_without_api_calls() {
    let k8s = FakeK8sBackend::with_namespace("jupyter-pods");
    let mapper = ServiceMapper::AmbassadorV1(MapperSettings::default());
    let mut svc = service("h-alice-s");

    mapper.start(&k8s, "alice", "/lw-workspace/proxy/", false, &mut svc).await.unwrap();

    let doc = v1_document(&svc);
    assert_eq!(doc["apiVersion"], "ambassador/v1");
    assert_eq!(doc["kind"], "Mapping");
    assert_eq!(doc["name"], "alice-mapping");
    assert_eq!(doc["prefix"], "/lw-workspace/proxy/");
    assert_eq!(doc["rewrite"], "/lw-workspace/proxy/");
    assert_eq!(doc["headers"]["remote_user"], "alice");
    assert_eq!(doc["service"], "h-alice-s.jupyter-pods.svc.cluster.local:80");
    assert_eq!(doc["timeout_ms"], 300000);
    assert_eq!(doc["use_websocket"], true);
    assert!(k8s.calls().is_empty());
}

#[tokio::test]
async fn v1_escapes_awkward_usernames() {
    let k8s = FakeK8sBackend::new();
    let mapper = ServiceMapper::AmbassadorV1(MapperSettings::default());
    let mut svc = service("h-x-s");

    mapper.start(&k8s, "a: \"b\"\n#c", "/", true, &mut svc).await.unwrap();

    let doc = v1_document(&svc);
    assert_eq!(doc["headers"]["remote_user"], "a: \"b\"\n#c");
    assert_eq!(doc["service"], "https://h-x-s.jupyter-pods.svc.cluster.local:443");
}

#[tokio::test]
async fn v2_applies_mapping_object() {
    let k8s = FakeK8sBackend::with_namespace("jupyter-pods");
    let mapper = ServiceMapper::AmbassadorV2(MapperSettings { timeout_ms: 1000, use_websocket: false });
    let mut svc = service("h-test-5fuser-s");

    mapper.start(&k8s, "test_user", "/lw-workspace/proxy/", true, &mut svc).await.unwrap();

    assert_eq!(k8s.calls(), vec![K8sCall::ApplyMapping("test-5fuser-mapping".to_string())]);
    let mapping = k8s.mapping("test-5fuser-mapping").unwrap();
    assert_eq!(mapping.metadata.namespace.as_deref(), Some("jupyter-pods"));
    let spec = &mapping.data["spec"];
    assert_eq!(spec["headers"]["remote_user"], "test_user");
    assert_eq!(spec["service"], "https://h-test-5fuser-s.jupyter-pods.svc.cluster.local:443");
    assert_eq!(spec["timeout_ms"], 1000);
    assert_eq!(spec["use_websocket"], false);
    assert!(svc.metadata.annotations.is_none());
}

#[tokio::test]
async fn v2_apply_failure_propagates() {
    let k8s = FakeK8sBackend::new();
    k8s.fail("apply_mapping");
    let mapper = ServiceMapper::AmbassadorV2(MapperSettings::default());

    let err = mapper.start(&k8s, "bob", "/", false, &mut service("h-bob-s")).await.unwrap_err();
    assert!(matches!(err, MapperError::Apply(_)));
}
