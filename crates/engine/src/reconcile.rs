// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-terminate polling that releases the pay-model lock.

use crate::error::HatcheryError;
use crate::status::pod_status;
use hatch_adapters::{EcsBackend, K8sBackend, PayModelStore};
use hatch_core::{PayModel, WorkspaceStatus};
use std::sync::Arc;
use std::time::Duration;

/// Where a workspace's status is read from while it is torn down.
#[derive(Clone)]
pub enum StatusProbe {
    Kubernetes(Arc<dyn K8sBackend>),
    Ecs { backend: Arc<dyn EcsBackend>, pay_model: PayModel },
}

impl StatusProbe {
    pub async fn status(&self, user: &str) -> Result<WorkspaceStatus, HatcheryError> {
        match self {
            StatusProbe::Kubernetes(k8s) => Ok(pod_status(k8s.as_ref(), user).await?),
            StatusProbe::Ecs { backend, pay_model } => Ok(backend.status(user, pay_model).await?),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Status reads, including the one that observed `Not Found`
    pub polls: u32,
    /// Whether the pay-model reset call succeeded
    pub reset: bool,
}

/// Poll until the workspace is gone, then reset the user's current pay model.
///
/// There is no deadline; the loop only ends by observing `Not Found` or by
/// being cancelled. Failed status reads are logged and retried.
pub async fn await_teardown(
    probe: StatusProbe,
    pay_models: &dyn PayModelStore,
    user: &str,
    interval: Duration,
) -> ReconcileReport {
    let mut polls = 0u32;
    loop {
        polls = polls.saturating_add(1);
        match probe.status(user).await {
            Ok(status) if status.is_not_found() => break,
            Ok(status) => {
                tracing::debug!(%user, polls, status = %status.status, "waiting for teardown");
            }
            Err(e) => tracing::warn!(%user, polls, error = %e, "status poll failed"),
        }
        tokio::time::sleep(interval).await;
    }

    let reset = match pay_models.reset_current(user).await {
        Ok(()) => {
            tracing::info!(%user, polls, "workspace gone, pay model reset");
            true
        }
        Err(e) => {
            tracing::error!(%user, error = %e, "pay model reset failed after teardown");
            false
        }
    };
    ReconcileReport { polls, reset }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
