// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod, Service and claim construction for a user's workspace.
//!
//! Everything here is pure: the same inputs always produce the same objects,
//! and every input is validated before any object leaves this module.

use hatch_core::{resource_name, Container, HatcheryConfig, Quantity, ResourceKind};
use k8s_openapi::api::core::v1::{
    Container as K8sContainer, EmptyDirVolumeSource, EnvVar, ExecAction, HTTPGetAction, Lifecycle,
    LifecycleHandler, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, Pod, PodSecurityContext, PodSpec, Probe,
    ResourceRequirements, SecurityContext, Service, ServicePort, ServiceSpec, Toleration, Volume,
    VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as K8sQuantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

pub const SIDECAR_NAME: &str = "fuse-container";
pub const PRIMARY_NAME: &str = "hatchery-container";

const SHARED_VOLUME: &str = "shared-data";
const SHM_VOLUME: &str = "dshm";
const USER_VOLUME: &str = "user-data";
const SHARED_MOUNT: &str = "/data";

/// Environment variable names accepted by the API server.
#[allow(clippy::expect_used)]
static ENV_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-._a-zA-Z][-._a-zA-Z0-9]*$").expect("constant regex pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid {field} quantity {value:?}")]
    Quantity { field: &'static str, value: String },
    #[error("invalid environment entry {0:?}, expected KEY=VALUE")]
    Env(String),
}

/// Inputs for one workspace pod.
pub struct PodParams<'a> {
    pub config: &'a HatcheryConfig,
    pub namespace: &'a str,
    pub container: &'a Container,
    pub user: &'a str,
    /// Appended to the primary container's environment
    pub extra_env: &'a [(String, String)],
}

/// Parse `KEY=VALUE` entries. The value may be empty or contain `=`.
pub fn parse_env(entries: &[String]) -> Result<Vec<EnvVar>, BuildError> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((name, value)) if ENV_NAME.is_match(name) => Ok(env_var(name, value)),
            _ => Err(BuildError::Env(entry.clone())),
        })
        .collect()
}

/// Check the descriptor fields a workload is built from without building it.
pub fn validate_container(container: &Container) -> Result<(), BuildError> {
    quantity("cpu", &container.cpu_limit)?;
    quantity("memory", &container.memory_limit)?;
    parse_env(&container.env)?;
    Ok(())
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.to_string()), ..Default::default() }
}

fn quantity(field: &'static str, raw: &str) -> Result<K8sQuantity, BuildError> {
    Quantity::parse(raw)
        .map(|q| K8sQuantity(q.as_str().to_string()))
        .map_err(|_| BuildError::Quantity { field, value: raw.to_string() })
}

/// Requests equal to limits, so workspaces get guaranteed QoS.
fn resources(cpu: &str, memory: &str) -> Result<ResourceRequirements, BuildError> {
    let amounts = BTreeMap::from([
        ("cpu".to_string(), quantity("cpu", cpu)?),
        ("memory".to_string(), quantity("memory", memory)?),
    ]);
    Ok(ResourceRequirements {
        limits: Some(amounts.clone()),
        requests: Some(amounts),
        ..Default::default()
    })
}

fn exec_hook(command: &[String]) -> Option<LifecycleHandler> {
    (!command.is_empty()).then(|| LifecycleHandler {
        exec: Some(ExecAction { command: Some(command.to_vec()) }),
        ..Default::default()
    })
}

fn mount(volume: &str, path: &str, propagation: Option<&str>) -> VolumeMount {
    VolumeMount {
        name: volume.to_string(),
        mount_path: path.to_string(),
        mount_propagation: propagation.map(str::to_string),
        ..Default::default()
    }
}

fn non_empty(v: &[String]) -> Option<Vec<String>> {
    (!v.is_empty()).then(|| v.to_vec())
}

fn workspace_labels(user: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), resource_name(user, ResourceKind::Pod))])
}

fn workspace_annotations(user: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("gen3username".to_string(), user.to_string())])
}

pub fn build_pod(params: &PodParams<'_>) -> Result<Pod, BuildError> {
    let PodParams { config, namespace, container, user, extra_env } = *params;
    let sidecar = &config.sidecar;

    let mut volumes = vec![Volume {
        name: SHARED_VOLUME.to_string(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    }];
    let mut sidecar_mounts = vec![mount(SHARED_VOLUME, SHARED_MOUNT, Some("Bidirectional"))];
    let mut primary_mounts = vec![mount(SHARED_VOLUME, SHARED_MOUNT, Some("HostToContainer"))];

    if container.use_shared_memory {
        volumes.push(Volume {
            name: SHM_VOLUME.to_string(),
            empty_dir: Some(EmptyDirVolumeSource {
                medium: Some("Memory".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        sidecar_mounts.push(mount(SHM_VOLUME, "/dev/shm", None));
        primary_mounts.push(mount(SHM_VOLUME, "/dev/shm", None));
    }

    if !container.user_volume_location.is_empty() {
        volumes.push(Volume {
            name: USER_VOLUME.to_string(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: resource_name(user, ResourceKind::Claim),
                ..Default::default()
            }),
            ..Default::default()
        });
        let location = container.user_volume_location.as_str();
        sidecar_mounts.push(mount(USER_VOLUME, location, Some("HostToContainer")));
        primary_mounts.push(mount(USER_VOLUME, location, None));
    }

    let sidecar_env = sidecar.env.iter().map(|(k, v)| env_var(k, v)).collect();
    let mut containers = vec![K8sContainer {
        name: SIDECAR_NAME.to_string(),
        image: Some(sidecar.image.clone()),
        image_pull_policy: Some("Always".to_string()),
        security_context: Some(SecurityContext {
            privileged: Some(true),
            run_as_user: Some(0),
            run_as_group: Some(0),
            ..Default::default()
        }),
        env: Some(sidecar_env),
        command: non_empty(&sidecar.command),
        args: non_empty(&sidecar.args),
        resources: Some(resources(&sidecar.cpu_limit, &sidecar.memory_limit)?),
        volume_mounts: Some(sidecar_mounts),
        lifecycle: exec_hook(&sidecar.lifecycle_pre_stop)
            .map(|pre_stop| Lifecycle { pre_stop: Some(pre_stop), ..Default::default() }),
        ..Default::default()
    }];

    if !container.image.is_empty() {
        let mut env = parse_env(&container.env)?;
        env.extend(extra_env.iter().map(|(k, v)| env_var(k, v)));

        let pre_stop = exec_hook(&container.lifecycle_pre_stop);
        let post_start = exec_hook(&container.lifecycle_post_start);
        let lifecycle = (pre_stop.is_some() || post_start.is_some())
            .then_some(Lifecycle { pre_stop, post_start, ..Default::default() });

        containers.push(K8sContainer {
            name: PRIMARY_NAME.to_string(),
            image: Some(container.image.clone()),
            image_pull_policy: Some(container.pull_policy.to_string()),
            security_context: Some(SecurityContext { privileged: Some(false), ..Default::default() }),
            env: Some(env),
            command: non_empty(&container.command),
            args: non_empty(&container.args),
            resources: Some(resources(&container.cpu_limit, &container.memory_limit)?),
            volume_mounts: Some(primary_mounts),
            lifecycle,
            readiness_probe: Some(Probe {
                http_get: Some(HTTPGetAction {
                    path: Some(container.ready_probe.clone()).filter(|p| !p.is_empty()),
                    port: IntOrString::Int(container.target_port),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
    }

    containers.extend(container.friends.iter().cloned());

    let declared = |id: i64| (id != 0).then_some(id);
    let security_context = (container.user_uid != 0
        || container.group_uid != 0
        || container.fs_gid != 0)
        .then(|| PodSecurityContext {
            run_as_user: declared(container.user_uid),
            run_as_group: declared(container.group_uid),
            fs_group: declared(container.fs_gid),
            ..Default::default()
        });

    Ok(Pod {
        metadata: ObjectMeta {
            name: Some(resource_name(user, ResourceKind::Pod)),
            namespace: Some(namespace.to_string()),
            labels: Some(workspace_labels(user)),
            annotations: Some(workspace_annotations(user)),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers,
            volumes: Some(volumes),
            security_context,
            restart_policy: Some("Never".to_string()),
            tolerations: Some(vec![Toleration {
                key: Some("role".to_string()),
                operator: Some("Equal".to_string()),
                value: Some(config.node_role.clone()),
                effect: Some("NoSchedule".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// ClusterIP service forwarding port 80 to the workspace's target port.
pub fn build_service(namespace: &str, user: &str, target_port: i32) -> Service {
    let pod_name = resource_name(user, ResourceKind::Pod);
    Service {
        metadata: ObjectMeta {
            name: Some(resource_name(user, ResourceKind::Service)),
            namespace: Some(namespace.to_string()),
            labels: Some(workspace_labels(user)),
            annotations: Some(BTreeMap::new()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(workspace_labels(user)),
            ports: Some(vec![ServicePort {
                name: Some(pod_name),
                protocol: Some("TCP".to_string()),
                port: 80,
                target_port: Some(IntOrString::Int(target_port)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Per-user ReadWriteOnce claim sized by `user-volume-size`.
pub fn build_claim(
    config: &HatcheryConfig,
    namespace: &str,
    user: &str,
) -> Result<PersistentVolumeClaim, BuildError> {
    let storage = quantity("storage", &config.user_volume_size)?;
    Ok(PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(resource_name(user, ResourceKind::Claim)),
            namespace: Some(namespace.to_string()),
            labels: Some(workspace_labels(user)),
            annotations: Some(workspace_annotations(user)),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([("storage".to_string(), storage)])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    })
}

#[cfg(test)]
#[path = "pod_tests.rs"]
mod tests;
