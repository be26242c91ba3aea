// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

const MINIMAL_JSON: &str = r#"{
    "user-namespace": "jupyter-pods",
    "sidecar": {
        "image": "quay.io/cdis/gen3fuse-sidecar:master",
        "cpu-limit": "0.1",
        "memory-limit": "256Mi",
        "env": {"NAMESPACE": "default", "HOSTNAME": "example.org"}
    },
    "containers": [
        {"name": "Jupyter", "id": "jupyter", "cpu-limit": "1", "memory-limit": "2Gi", "target-port": 8888},
        {"name": "RStudio", "cpu-limit": "2", "memory-limit": "4Gi", "target-port": 8787}
    ],
    "service-mapper": {"ambassador-v2": {"timeout-ms": 60000}}
}"#;

#[test]
fn json_defaults_are_filled_in() {
    let config = HatcheryConfig::from_json_str(MINIMAL_JSON).unwrap();

    assert_eq!(config.user_namespace, "jupyter-pods");
    assert_eq!(config.user_volume_size, "10Gi");
    assert_eq!(config.node_role, "jupyter");
    assert_eq!(config.reconcile_interval(), Duration::from_secs(5));
    assert_eq!(config.delete_grace_seconds, 20);
    assert_eq!(config.pay_models_table, None);
    assert_eq!(config.ecs, None);
    assert_eq!(
        config.service_mapper,
        Some(ServiceMapperConfig::AmbassadorV2(MapperSettings {
            timeout_ms: 60_000,
            use_websocket: true,
        }))
    );
    let keys: Vec<_> = config.sidecar.env.keys().cloned().collect();
    assert_eq!(keys, vec!["HOSTNAME", "NAMESPACE"]);
}

#[test]
fn container_lookup_by_id() {
    let config = HatcheryConfig::from_json_str(MINIMAL_JSON).unwrap();

    assert_eq!(config.container("jupyter").map(|c| c.name.as_str()), Some("Jupyter"));
    let rstudio_id = config.containers[1].app_id();
    assert_eq!(config.container(&rstudio_id).map(|c| c.target_port), Some(8787));
    assert!(config.container("missing").is_none());
    assert_eq!(config.options().len(), 2);
}

#[test]
fn missing_service_mapper_is_fatal() {
    let mut value: serde_json::Value = serde_json::from_str(MINIMAL_JSON).unwrap();
    value.as_object_mut().unwrap().remove("service-mapper");

    let err = HatcheryConfig::from_json_str(&value.to_string()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingServiceMapper));
    assert_eq!(err.to_string(), "Service mapper not found");
}

#[test]
fn duplicate_app_ids_are_rejected() {
    let mut value: serde_json::Value = serde_json::from_str(MINIMAL_JSON).unwrap();
    value["containers"][1]["id"] = serde_json::json!("jupyter");

    let err = HatcheryConfig::from_json_str(&value.to_string()).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateApp(ref id) if id == "jupyter"));
}

#[test]
fn toml_file_is_detected_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hatchery.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
user-namespace = "workspaces"
hostname = "example.org"
reconcile-poll-ms = 250

[sidecar]
image = "fuse"
cpu-limit = "0.1"
memory-limit = "64Mi"

[service-mapper.ambassador-v1]

[ecs]
subnets = ["subnet-1"]

[[external-clusters]]
account-id = "123456789012"
kubeconfig = "/etc/hatchery/ext.kubeconfig"
"#
    )
    .unwrap();

    let config = HatcheryConfig::load(&path).unwrap();
    assert_eq!(config.hostname, "example.org");
    assert_eq!(config.reconcile_interval(), Duration::from_millis(250));
    assert_eq!(config.service_mapper, Some(ServiceMapperConfig::AmbassadorV1(MapperSettings::default())));
    let ecs = config.ecs.unwrap();
    assert_eq!(ecs.cluster_name, "hatchery");
    assert_eq!(ecs.subnets, vec!["subnet-1"]);
    assert_eq!(config.external_clusters[0].namespace, None);
}

#[test]
fn json_file_is_the_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hatchery.conf");
    std::fs::write(&path, MINIMAL_JSON).unwrap();

    assert!(HatcheryConfig::load(&path).is_ok());
}

#[test]
fn unreadable_file_reports_path() {
    let err = HatcheryConfig::load(Path::new("/nonexistent/hatchery.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("/nonexistent/hatchery.json"));
}
