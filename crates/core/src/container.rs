// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application descriptors a user can launch as a workspace.

use k8s_openapi::api::core::v1::Container as K8sContainer;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Image pull policy of the primary container.
///
/// Unrecognized values fall back to `IfNotPresent`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PullPolicy {
    #[default]
    IfNotPresent,
    Always,
    Never,
}

impl From<String> for PullPolicy {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Always" => PullPolicy::Always,
            "Never" => PullPolicy::Never,
            _ => PullPolicy::IfNotPresent,
        }
    }
}

crate::simple_display! {
    PullPolicy {
        IfNotPresent => "IfNotPresent",
        Always => "Always",
        Never => "Never",
    }
}

/// A launchable application.
///
/// Built once from configuration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Container {
    pub name: String,
    /// Empty for workloads made only of friend containers
    #[serde(default)]
    pub image: String,
    pub cpu_limit: String,
    pub memory_limit: String,
    #[serde(default)]
    pub ready_probe: String,
    #[serde(default)]
    pub path_rewrite: String,
    /// Mount path of the per-user volume; empty means no volume
    #[serde(default)]
    pub user_volume_location: String,
    #[serde(default)]
    pub target_port: i32,
    #[serde(default)]
    pub pull_policy: PullPolicy,
    /// `KEY=VALUE` entries
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub friends: Vec<K8sContainer>,
    #[serde(default)]
    pub lifecycle_pre_stop: Vec<String>,
    #[serde(default)]
    pub lifecycle_post_start: Vec<String>,
    /// Zero leaves the image default in place
    #[serde(default)]
    pub user_uid: i64,
    #[serde(default)]
    pub group_uid: i64,
    #[serde(default)]
    pub fs_gid: i64,
    #[serde(default, deserialize_with = "flag")]
    pub use_shared_memory: bool,
    #[serde(default, deserialize_with = "flag")]
    pub use_tls: bool,
    #[serde(default)]
    pub id: Option<String>,
}

impl Container {
    /// Id used by `launch?id=`; the explicit id, or the hex SHA-256 of the name.
    pub fn app_id(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => {
                let digest = Sha256::digest(self.name.as_bytes());
                digest.iter().map(|b| format!("{b:02x}")).collect()
            }
        }
    }

    pub fn option(&self) -> AppOption {
        AppOption {
            name: self.name.clone(),
            id: self.app_id(),
            cpu_limit: self.cpu_limit.clone(),
            memory_limit: self.memory_limit.clone(),
        }
    }
}

/// Summary of an application, as listed by the options endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppOption {
    pub name: String,
    pub id: String,
    pub cpu_limit: String,
    pub memory_limit: String,
}

/// Accepts `true`/`false` either as JSON booleans or as strings.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.eq_ignore_ascii_case("true"),
    })
}

crate::builder! {
    pub struct ContainerBuilder => Container {
        into {
            name: String = "jupyter",
            image: String = "quay.io/jupyter/base-notebook:latest",
            cpu_limit: String = "1",
            memory_limit: String = "1Gi",
            ready_probe: String = "/lw-workspace/proxy/",
            path_rewrite: String = "/lw-workspace/proxy/",
            user_volume_location: String = "",
        }
        set {
            target_port: i32 = 8888,
            pull_policy: PullPolicy = PullPolicy::IfNotPresent,
            env: Vec<String> = Vec::new(),
            command: Vec<String> = Vec::new(),
            args: Vec<String> = Vec::new(),
            friends: Vec<K8sContainer> = Vec::new(),
            lifecycle_pre_stop: Vec<String> = Vec::new(),
            lifecycle_post_start: Vec<String> = Vec::new(),
            user_uid: i64 = 0,
            group_uid: i64 = 0,
            fs_gid: i64 = 0,
            use_shared_memory: bool = false,
            use_tls: bool = false,
        }
        option {
            id: String = Some("jupyter".to_string()),
        }
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
