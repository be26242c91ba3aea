// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::config::{HatcheryConfig, MapperSettings, ServiceMapperConfig, SidecarConfig};
use crate::container::Container;
use std::collections::BTreeMap;

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use proptest::prelude::*;

    /// Usernames as they show up in `REMOTE_USER`: emails, underscores, mixed case.
    pub fn arb_username() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_.@+-]{1,24}"
    }
}

// ── Config factories ────────────────────────────────────────────────────

pub fn sidecar() -> SidecarConfig {
    SidecarConfig {
        image: "quay.io/cdis/gen3fuse-sidecar:master".to_string(),
        cpu_limit: "0.1".to_string(),
        memory_limit: "256Mi".to_string(),
        command: vec!["/bin/bash".to_string()],
        args: vec!["/sidecarDockerrun.sh".to_string()],
        env: BTreeMap::from([
            ("HOSTNAME".to_string(), "example.org".to_string()),
            ("NAMESPACE".to_string(), "default".to_string()),
        ]),
        lifecycle_pre_stop: vec!["su".to_string(), "-c".to_string(), "cd /data; umount *".to_string()],
    }
}

/// A valid configuration with one application (`jupyter`) and the v2 mapper.
pub fn config() -> HatcheryConfig {
    config_with(vec![Container::builder().build()])
}

pub fn config_with(containers: Vec<Container>) -> HatcheryConfig {
    HatcheryConfig {
        user_namespace: "jupyter-pods".to_string(),
        hostname: "example.org".to_string(),
        user_volume_size: "10Gi".to_string(),
        sidecar: sidecar(),
        containers,
        service_mapper: Some(ServiceMapperConfig::AmbassadorV2(MapperSettings::default())),
        node_role: "jupyter".to_string(),
        reconcile_poll_ms: 10,
        delete_grace_seconds: 20,
        pay_models_table: None,
        ecs: None,
        external_clusters: Vec::new(),
    }
}
