// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway registration for workspace services.
//!
//! Exactly one mapper flavour is active, chosen from configuration at startup.

use crate::k8s::{K8sBackend, KubeError};
use hatch_core::{resource_name, MapperSettings, ResourceKind, ServiceMapperConfig};
use k8s_openapi::api::core::v1::Service;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use kube::ResourceExt;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// URL prefix the gateway routes to workspaces
pub const PROXY_PREFIX: &str = "/lw-workspace/proxy/";

const V1_ANNOTATION: &str = "getambassador.io/config";

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Service mapper not found")]
    NotConfigured,
    #[error("service mapping failed: {0}")]
    Apply(#[from] KubeError),
    #[error("service mapping could not be rendered: {0}")]
    Render(#[from] serde_yaml::Error),
}

/// `getambassador.io/v2` `Mapping` custom resource.
pub fn mapping_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk("getambassador.io", "v2", "Mapping"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceMapper {
    /// Inline `getambassador.io/config` annotation on the Service
    AmbassadorV1(MapperSettings),
    /// Standalone `Mapping` object applied next to the Service
    AmbassadorV2(MapperSettings),
}

impl ServiceMapper {
    pub fn from_config(config: Option<&ServiceMapperConfig>) -> Result<Self, MapperError> {
        match config {
            Some(ServiceMapperConfig::AmbassadorV1(s)) => Ok(Self::AmbassadorV1(s.clone())),
            Some(ServiceMapperConfig::AmbassadorV2(s)) => Ok(Self::AmbassadorV2(s.clone())),
            None => Err(MapperError::NotConfigured),
        }
    }

    /// Register `service` with the gateway so `user`'s requests reach it.
    ///
    /// Runs before the Service is submitted; the v1 flavour only edits it.
    pub async fn start(
        &self,
        k8s: &dyn K8sBackend,
        user: &str,
        path_rewrite: &str,
        use_tls: bool,
        service: &mut Service,
    ) -> Result<(), MapperError> {
        let upstream = upstream(&service.name_any(), k8s.namespace(), use_tls);
        match self {
            Self::AmbassadorV1(settings) => {
                let spec = MappingSpec::new(user, path_rewrite, &upstream, settings);
                let doc = v1_config(user, spec)?;
                service.annotations_mut().insert(V1_ANNOTATION.to_string(), doc);
            }
            Self::AmbassadorV2(settings) => {
                let spec = MappingSpec::new(user, path_rewrite, &upstream, settings);
                k8s.apply_mapping(&v2_mapping(user, k8s.namespace(), spec)).await?;
            }
        }
        tracing::info!(%user, upstream = %upstream, "service mapping registered");
        Ok(())
    }
}

fn upstream(service: &str, namespace: &str, use_tls: bool) -> String {
    if use_tls {
        format!("https://{service}.{namespace}.svc.cluster.local:443")
    } else {
        format!("{service}.{namespace}.svc.cluster.local:80")
    }
}

/// Routing fields shared by both mapper flavours.
#[derive(Debug, Serialize)]
struct MappingSpec<'a> {
    prefix: &'static str,
    headers: BTreeMap<&'static str, &'a str>,
    rewrite: &'a str,
    service: &'a str,
    use_websocket: bool,
    timeout_ms: u64,
}

impl<'a> MappingSpec<'a> {
    fn new(user: &'a str, rewrite: &'a str, service: &'a str, settings: &MapperSettings) -> Self {
        Self {
            prefix: PROXY_PREFIX,
            headers: BTreeMap::from([("remote_user", user)]),
            rewrite,
            service,
            use_websocket: settings.use_websocket,
            timeout_ms: settings.timeout_ms,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct V1Mapping<'a> {
    api_version: &'static str,
    kind: &'static str,
    name: String,
    #[serde(flatten)]
    spec: MappingSpec<'a>,
}

fn v1_config(user: &str, spec: MappingSpec<'_>) -> Result<String, MapperError> {
    let mapping = V1Mapping {
        api_version: "ambassador/v1",
        kind: "Mapping",
        name: resource_name(user, ResourceKind::Mapping),
        spec,
    };
    Ok(format!("---\n{}", serde_yaml::to_string(&mapping)?))
}

fn v2_mapping(user: &str, namespace: &str, spec: MappingSpec<'_>) -> DynamicObject {
    let name = resource_name(user, ResourceKind::Mapping);
    DynamicObject::new(&name, &mapping_resource())
        .within(namespace)
        .data(serde_json::json!({ "spec": spec }))
}

#[cfg(test)]
#[path = "mapper_tests.rs"]
mod tests;
