// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observed workspace status.
//!
//! Recomputed from live backend state on every inquiry and never stored.

use k8s_openapi::api::core::v1::ContainerState;
use serde::{Deserialize, Serialize};

/// Coarse workspace state reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Not Found")]
    NotFound,
    Terminating,
    Stopped,
    Launching,
    Running,
}

crate::simple_display! {
    Status {
        NotFound => "Not Found",
        Terminating => "Terminating",
        Stopped => "Stopped",
        Launching => "Launching",
        Running => "Running",
    }
}

/// A pod condition, reduced to its type and truth value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodCondition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

/// Readiness snapshot of one container in a launching pod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerReadiness {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ContainerState>,
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceStatus {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PodCondition>,
    #[serde(rename = "containerStates", default, skip_serializing_if = "Vec::is_empty")]
    pub container_states: Vec<ContainerReadiness>,
}

impl WorkspaceStatus {
    pub fn new(status: Status) -> Self {
        Self { status, conditions: Vec::new(), container_states: Vec::new() }
    }

    pub fn not_found() -> Self {
        Self::new(Status::NotFound)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Status::NotFound
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
