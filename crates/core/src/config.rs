// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller configuration, loaded once at startup and shared read-only.

use crate::container::{AppOption, Container};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Service mapper not found")]
    MissingServiceMapper,
    #[error("duplicate application id {0}")]
    DuplicateApp(String),
}

/// Privileged fuse sidecar present in every workspace pod.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SidecarConfig {
    pub image: String,
    pub cpu_limit: String,
    pub memory_limit: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub lifecycle_pre_stop: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MapperSettings {
    pub timeout_ms: u64,
    pub use_websocket: bool,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self { timeout_ms: 300_000, use_websocket: true }
    }
}

/// Gateway registration flavour for workspace services.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceMapperConfig {
    AmbassadorV1(MapperSettings),
    AmbassadorV2(MapperSettings),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EcsConfig {
    #[serde(default = "default_ecs_cluster")]
    pub cluster_name: String,
    /// Role assumed in the pay model's account
    #[serde(default = "default_ecs_role")]
    pub role_name: String,
    #[serde(default)]
    pub execution_role_arn: Option<String>,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default)]
    pub assign_public_ip: bool,
}

/// A Kubernetes cluster billed to an external account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExternalCluster {
    pub account_id: String,
    pub kubeconfig: PathBuf,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HatcheryConfig {
    pub user_namespace: String,
    /// Public endpoint handed to workloads as `GEN3_ENDPOINT`
    #[serde(default)]
    pub hostname: String,
    #[serde(default = "default_volume_size")]
    pub user_volume_size: String,
    pub sidecar: SidecarConfig,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub service_mapper: Option<ServiceMapperConfig>,
    #[serde(default = "default_node_role")]
    pub node_role: String,
    #[serde(default = "default_reconcile_poll_ms")]
    pub reconcile_poll_ms: u64,
    #[serde(default = "default_delete_grace_seconds")]
    pub delete_grace_seconds: u32,
    #[serde(default)]
    pub pay_models_table: Option<String>,
    #[serde(default)]
    pub ecs: Option<EcsConfig>,
    #[serde(default)]
    pub external_clusters: Vec<ExternalCluster>,
}

fn default_volume_size() -> String {
    "10Gi".to_string()
}

fn default_node_role() -> String {
    "jupyter".to_string()
}

fn default_reconcile_poll_ms() -> u64 {
    5_000
}

fn default_delete_grace_seconds() -> u32 {
    20
}

fn default_ecs_cluster() -> String {
    "hatchery".to_string()
}

fn default_ecs_role() -> String {
    "csoc_adminvm".to_string()
}

impl HatcheryConfig {
    /// Read and validate a config file; `.toml` files are parsed as TOML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml_str(&text)
        } else {
            Self::from_json_str(&text)
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.service_mapper.is_none() {
            return Err(ConfigError::MissingServiceMapper);
        }
        let mut seen = HashSet::new();
        for container in &self.containers {
            let id = container.app_id();
            if !seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateApp(id));
            }
        }
        Ok(())
    }

    /// Look up an application by launch id.
    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.app_id() == id)
    }

    pub fn options(&self) -> Vec<AppOption> {
        self.containers.iter().map(Container::option).collect()
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_poll_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
