// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace status inference from live pod state.

use hatch_adapters::{K8sBackend, KubeError};
use hatch_core::{
    resource_name, ContainerReadiness, PodCondition, ResourceKind, Status, WorkspaceStatus,
};
use k8s_openapi::api::core::v1::Pod;

/// Condition types that gate readiness; all others are ignored.
const READINESS_CONDITIONS: [&str; 2] = ["Ready", "PodScheduled"];

fn phase(pod: &Pod) -> Option<&str> {
    pod.status.as_ref()?.phase.as_deref()
}

/// A pod is ready when it has left `Pending` and both its `Ready` and
/// `PodScheduled` conditions are present and `True`.
pub fn is_ready(pod: &Pod) -> bool {
    if phase(pod) == Some("Pending") {
        return false;
    }
    let conditions = pod.status.as_ref().and_then(|s| s.conditions.as_deref()).unwrap_or_default();
    READINESS_CONDITIONS.iter().all(|kind| {
        let matching: Vec<_> = conditions.iter().filter(|c| c.type_ == *kind).collect();
        !matching.is_empty() && matching.iter().all(|c| c.status == "True")
    })
}

/// Classify a looked-up pod. `None` means no pod exists.
pub fn classify_pod(pod: Option<&Pod>) -> WorkspaceStatus {
    let Some(pod) = pod else {
        return WorkspaceStatus::not_found();
    };
    if pod.metadata.deletion_timestamp.is_some() {
        return WorkspaceStatus::new(Status::Terminating);
    }
    match phase(pod) {
        Some("Failed" | "Succeeded" | "Unknown") => WorkspaceStatus::new(Status::Stopped),
        Some("Running") if is_ready(pod) => WorkspaceStatus::new(Status::Running),
        Some("Pending" | "Running") | None => launching(pod),
        Some(other) => {
            tracing::warn!(phase = other, "unrecognized pod phase");
            WorkspaceStatus::new(Status::Stopped)
        }
    }
}

fn launching(pod: &Pod) -> WorkspaceStatus {
    let status = pod.status.as_ref();
    let conditions = status
        .and_then(|s| s.conditions.as_ref())
        .into_iter()
        .flatten()
        .map(|c| PodCondition { kind: c.type_.clone(), status: c.status.clone() })
        .collect();
    let container_states = status
        .and_then(|s| s.container_statuses.as_ref())
        .into_iter()
        .flatten()
        .map(|c| ContainerReadiness { name: c.name.clone(), state: c.state.clone(), ready: c.ready })
        .collect();
    WorkspaceStatus { status: Status::Launching, conditions, container_states }
}

/// One pod lookup, then classification. Never mutates the cluster.
pub async fn pod_status(k8s: &dyn K8sBackend, user: &str) -> Result<WorkspaceStatus, KubeError> {
    let pod = k8s.get_pod(&resource_name(user, ResourceKind::Pod)).await?;
    Ok(classify_pod(pod.as_ref()))
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
