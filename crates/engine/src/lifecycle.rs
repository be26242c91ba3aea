// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Create and delete the Kubernetes objects backing one workspace.

use crate::error::HatcheryError;
use crate::pod::{build_claim, build_pod, build_service, PodParams};
use hatch_adapters::{K8sBackend, ServiceMapper};
use hatch_core::{resource_name, Container, HatcheryConfig, ResourceKind};

/// Workspace object operations against one namespace.
pub struct LifecycleManager<'a> {
    pub k8s: &'a dyn K8sBackend,
    pub mapper: &'a ServiceMapper,
    pub config: &'a HatcheryConfig,
}

impl LifecycleManager<'_> {
    /// Claim (get-or-create), pod, orphan-service cleanup, mapping, service.
    ///
    /// Every object is built before the first API call, so a construction
    /// error submits nothing. A failed submission stops the sequence and
    /// leaves earlier objects in place.
    pub async fn create_workload(
        &self,
        container: &Container,
        user: &str,
        extra_env: &[(String, String)],
    ) -> Result<(), HatcheryError> {
        let namespace = self.k8s.namespace();
        let pod = build_pod(&PodParams {
            config: self.config,
            namespace,
            container,
            user,
            extra_env,
        })?;
        let claim = if container.user_volume_location.is_empty() {
            None
        } else {
            Some(build_claim(self.config, namespace, user)?)
        };
        let mut service = build_service(namespace, user, container.target_port);

        if let Some(claim) = claim {
            let claim_name = resource_name(user, ResourceKind::Claim);
            if self.k8s.get_claim(&claim_name).await?.is_none() {
                self.k8s.create_claim(&claim).await?;
                tracing::info!(%user, claim = %claim_name, "created user volume claim");
            }
        }

        self.k8s.create_pod(&pod).await?;
        tracing::info!(%user, %namespace, app = %container.name, "created workspace pod");

        let service_name = resource_name(user, ResourceKind::Service);
        if self.k8s.get_service(&service_name).await?.is_some() {
            tracing::warn!(%user, service = %service_name, "deleting orphaned service");
            self.k8s.delete_service(&service_name, Some(0)).await?;
        }

        self.mapper
            .start(self.k8s, user, &container.path_rewrite, container.use_tls, &mut service)
            .await?;
        self.k8s.create_service(&service).await?;
        tracing::info!(%user, service = %service_name, "created workspace service");
        Ok(())
    }

    /// Issue deletes for the pod and service and return without waiting.
    ///
    /// Both objects must exist; a missing one fails before anything is deleted.
    pub async fn delete_workload(&self, user: &str) -> Result<(), HatcheryError> {
        let pod_name = resource_name(user, ResourceKind::Pod);
        let service_name = resource_name(user, ResourceKind::Service);

        if self.k8s.get_pod(&pod_name).await?.is_none() {
            return Err(HatcheryError::NotFound("A workspace pod was not found".to_string()));
        }
        if self.k8s.get_service(&service_name).await?.is_none() {
            return Err(HatcheryError::NotFound("A workspace service was not found".to_string()));
        }

        let grace = Some(self.config.delete_grace_seconds);
        self.k8s.delete_pod(&pod_name, grace).await?;
        self.k8s.delete_service(&service_name, grace).await?;
        tracing::info!(%user, pod = %pod_name, "workspace delete accepted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
