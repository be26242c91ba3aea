// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pay-model driven routing of launch, terminate and status.
//!
//! A user's current pay model picks the backend:
//!
//! | current pay model        | backend                                   |
//! |--------------------------|-------------------------------------------|
//! | none                     | local Kubernetes                          |
//! | `local`                  | local Kubernetes                          |
//! | `ecs`                    | ECS (launch runs in the background)       |
//! | neither                  | external Kubernetes for the account id    |

use crate::error::HatcheryError;
use crate::lifecycle::LifecycleManager;
use crate::pod::validate_container;
use crate::reconcile::{await_teardown, StatusProbe};
use crate::tasks::BackgroundTasks;
use hatch_adapters::{EcsBackend, EcsLaunch, K8sBackend, PayModelStore, ServiceMapper};
use hatch_core::{AllPayModels, AppOption, BackendKind, HatcheryConfig, PayModel, WorkspaceStatus};
use std::collections::HashMap;
use std::sync::Arc;

/// Collaborators the dispatcher routes between.
pub struct HatcheryDeps {
    pub local: Arc<dyn K8sBackend>,
    /// External clusters keyed by pay-model account id
    pub external: HashMap<String, Arc<dyn K8sBackend>>,
    pub pay_models: Arc<dyn PayModelStore>,
    pub ecs: Arc<dyn EcsBackend>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Kubernetes objects were submitted
    Launched,
    /// ECS launch continues in the background
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminateOutcome {
    Kubernetes,
    /// Carries the ECS backend's description of what was removed
    Ecs(String),
}

/// Resolved backend for one request.
#[derive(Clone)]
enum Target {
    Kubernetes { k8s: Arc<dyn K8sBackend>, external: bool },
    Ecs(PayModel),
}

/// Handle to the lifecycle controller. Cheap to clone.
#[derive(Clone)]
pub struct Hatchery {
    config: Arc<HatcheryConfig>,
    mapper: Arc<ServiceMapper>,
    local: Arc<dyn K8sBackend>,
    external: Arc<HashMap<String, Arc<dyn K8sBackend>>>,
    pay_models: Arc<dyn PayModelStore>,
    ecs: Arc<dyn EcsBackend>,
    tasks: BackgroundTasks,
}

impl Hatchery {
    /// Fails when no service mapper is configured.
    pub fn new(config: Arc<HatcheryConfig>, deps: HatcheryDeps) -> Result<Self, HatcheryError> {
        let mapper = ServiceMapper::from_config(config.service_mapper.as_ref())?;
        Ok(Self {
            config,
            mapper: Arc::new(mapper),
            local: deps.local,
            external: Arc::new(deps.external),
            pay_models: deps.pay_models,
            ecs: deps.ecs,
            tasks: BackgroundTasks::new(),
        })
    }

    pub fn config(&self) -> &HatcheryConfig {
        &self.config
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    pub fn options(&self) -> Vec<AppOption> {
        self.config.options()
    }

    pub async fn pay_models(&self, user: &str) -> Result<AllPayModels, HatcheryError> {
        self.pay_models
            .pay_models(user)
            .await?
            .ok_or_else(|| HatcheryError::NotFound("Pay model data not found".to_string()))
    }

    pub async fn status(&self, user: &str) -> Result<WorkspaceStatus, HatcheryError> {
        let target = self.target(user).await?;
        self.probe(target).status(user).await
    }

    pub async fn launch(
        &self,
        app_id: &str,
        user: &str,
        access_token: Option<&str>,
    ) -> Result<LaunchOutcome, HatcheryError> {
        let container = self
            .config
            .container(app_id)
            .ok_or_else(|| HatcheryError::UnknownApp(app_id.to_string()))?;
        let target = self.target(user).await?;
        if let Target::Ecs(pay_model) = &target {
            if !pay_model.is_active() {
                return Err(HatcheryError::PayModelInactive);
            }
            // ECS launches finish after the response, so bad input must fail here
            validate_container(container)?;
        }

        let probe = self.probe(target.clone());
        if !probe.status(user).await?.is_not_found() {
            return Err(HatcheryError::AlreadyRunning);
        }

        match target {
            Target::Kubernetes { k8s, external } => {
                let env = self.workload_env(external, access_token);
                let manager = LifecycleManager {
                    k8s: k8s.as_ref(),
                    mapper: &self.mapper,
                    config: &self.config,
                };
                manager.create_workload(container, user, &env).await?;
                tracing::info!(%user, app = %app_id, namespace = %k8s.namespace(), "workspace launched");
                Ok(LaunchOutcome::Launched)
            }
            Target::Ecs(pay_model) => {
                let request = EcsLaunch {
                    user: user.to_string(),
                    container: container.clone(),
                    env: self.workload_env(true, access_token),
                    pay_model,
                };
                let ecs = Arc::clone(&self.ecs);
                let owner = user.to_string();
                self.tasks.spawn("ecs-launch", user, async move {
                    match ecs.launch(request).await {
                        Ok(arn) => tracing::info!(user = %owner, %arn, "ECS workspace launched"),
                        Err(e) => tracing::error!(user = %owner, error = %e, "ECS launch failed"),
                    }
                });
                Ok(LaunchOutcome::Accepted)
            }
        }
    }

    /// Accept deletion, then wait for teardown in the background before
    /// resetting the pay model.
    pub async fn terminate(&self, user: &str) -> Result<TerminateOutcome, HatcheryError> {
        let (outcome, probe) = match self.target(user).await? {
            Target::Ecs(pay_model) => {
                let removed = self.ecs.terminate(user, &pay_model).await?;
                (TerminateOutcome::Ecs(removed), self.probe(Target::Ecs(pay_model)))
            }
            Target::Kubernetes { k8s, .. } => {
                let manager = LifecycleManager {
                    k8s: k8s.as_ref(),
                    mapper: &self.mapper,
                    config: &self.config,
                };
                manager.delete_workload(user).await?;
                (TerminateOutcome::Kubernetes, StatusProbe::Kubernetes(k8s))
            }
        };

        let pay_models = Arc::clone(&self.pay_models);
        let interval = self.config.reconcile_interval();
        let owner = user.to_string();
        self.tasks.spawn("reconcile", user, async move {
            await_teardown(probe, pay_models.as_ref(), &owner, interval).await;
        });
        Ok(outcome)
    }

    pub async fn set_pay_model(&self, user: &str, id: &str) -> Result<PayModel, HatcheryError> {
        if !self.idle(user).await? {
            return Err(HatcheryError::UpdateWhileRunning);
        }
        let chosen = self.pay_models.set_current(user, id).await?;
        tracing::info!(%user, pay_model = %id, "current pay model set");
        Ok(chosen)
    }

    pub async fn reset_pay_models(&self, user: &str) -> Result<(), HatcheryError> {
        if !self.idle(user).await? {
            return Err(HatcheryError::ResetWhileRunning);
        }
        self.pay_models.reset_current(user).await?;
        tracing::info!(%user, "current pay model reset");
        Ok(())
    }

    /// No workspace on the routed backend. A pay model pointing at an
    /// unregistered cluster has nothing running there and must stay switchable.
    async fn idle(&self, user: &str) -> Result<bool, HatcheryError> {
        match self.status(user).await {
            Ok(status) => Ok(status.is_not_found()),
            Err(HatcheryError::UnknownCluster(account)) => {
                tracing::warn!(%user, %account, "current pay model has no registered cluster");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    async fn target(&self, user: &str) -> Result<Target, HatcheryError> {
        let current = self.pay_models.current_pay_model(user).await?;
        let Some(pay_model) = current else {
            return Ok(Target::Kubernetes { k8s: Arc::clone(&self.local), external: false });
        };
        match pay_model.backend() {
            BackendKind::LocalK8s => {
                Ok(Target::Kubernetes { k8s: Arc::clone(&self.local), external: false })
            }
            BackendKind::Ecs => Ok(Target::Ecs(pay_model)),
            BackendKind::ExternalK8s => {
                let k8s = self.cluster(&pay_model.account_id)?;
                Ok(Target::Kubernetes { k8s, external: true })
            }
        }
    }

    fn cluster(&self, account_id: &str) -> Result<Arc<dyn K8sBackend>, HatcheryError> {
        self.external
            .get(account_id)
            .cloned()
            .ok_or_else(|| HatcheryError::UnknownCluster(account_id.to_string()))
    }

    fn probe(&self, target: Target) -> StatusProbe {
        match target {
            Target::Kubernetes { k8s, .. } => StatusProbe::Kubernetes(k8s),
            Target::Ecs(pay_model) => {
                StatusProbe::Ecs { backend: Arc::clone(&self.ecs), pay_model }
            }
        }
    }

    /// Workloads outside the local auth proxy also get the caller's token.
    fn workload_env(&self, external: bool, access_token: Option<&str>) -> Vec<(String, String)> {
        let mut env = Vec::new();
        if !self.config.hostname.is_empty() {
            env.push(("GEN3_ENDPOINT".to_string(), self.config.hostname.clone()));
        }
        if let (true, Some(token)) = (external, access_token) {
            env.push(("ACCESS_TOKEN".to_string(), token.to_string()));
        }
        env
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
