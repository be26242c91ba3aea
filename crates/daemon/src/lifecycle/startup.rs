// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: configuration, collaborator wiring, controller handle.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use aws_config::SdkConfig;
use hatch_adapters::{
    AwsEcsBackend, DisabledEcs, DynamoPayModelStore, EcsBackend, K8sBackend, KubeBackend,
    NoPayModels, PayModelStore,
};
use hatch_core::HatcheryConfig;
use hatch_engine::{Hatchery, HatcheryDeps};
use tracing::info;

use super::{Config, LifecycleError};

/// Read and validate the configuration file. Any error here is fatal.
pub fn load_config(path: &Path) -> Result<Arc<HatcheryConfig>, LifecycleError> {
    let config = HatcheryConfig::load(path)?;
    info!(
        path = %path.display(),
        apps = config.containers.len(),
        clusters = config.external_clusters.len(),
        namespace = %config.user_namespace,
        "loaded configuration"
    );
    Ok(Arc::new(config))
}

/// Build every collaborator and the controller handle.
pub async fn startup(config: &Config) -> Result<Hatchery, LifecycleError> {
    let hatchery_config = load_config(&config.config_path)?;

    let local: Arc<dyn K8sBackend> =
        Arc::new(KubeBackend::try_default(hatchery_config.user_namespace.clone()).await?);

    let mut external: HashMap<String, Arc<dyn K8sBackend>> = HashMap::new();
    for cluster in &hatchery_config.external_clusters {
        let namespace =
            cluster.namespace.clone().unwrap_or_else(|| hatchery_config.user_namespace.clone());
        let backend =
            KubeBackend::from_kubeconfig(&cluster.kubeconfig, cluster.context.clone(), namespace)
                .await?;
        info!(account = %cluster.account_id, "registered external cluster");
        external.insert(cluster.account_id.clone(), Arc::new(backend));
    }

    let aws = if hatchery_config.pay_models_table.is_some() || hatchery_config.ecs.is_some() {
        Some(aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await)
    } else {
        None
    };

    let deps = HatcheryDeps {
        local,
        external,
        pay_models: pay_model_store(&hatchery_config, aws.as_ref()),
        ecs: ecs_backend(&hatchery_config, aws.as_ref()),
    };
    Ok(Hatchery::new(hatchery_config, deps)?)
}

fn pay_model_store(config: &HatcheryConfig, aws: Option<&SdkConfig>) -> Arc<dyn PayModelStore> {
    match (config.pay_models_table.as_deref(), aws) {
        (Some(table), Some(sdk)) => {
            info!(%table, "using DynamoDB pay-model store");
            Arc::new(DynamoPayModelStore::new(sdk, table))
        }
        _ => {
            info!("no pay-model table configured, all workspaces run locally");
            Arc::new(NoPayModels)
        }
    }
}

fn ecs_backend(config: &HatcheryConfig, aws: Option<&SdkConfig>) -> Arc<dyn EcsBackend> {
    match (config.ecs.as_ref(), aws) {
        (Some(ecs), Some(sdk)) => {
            info!(cluster = %ecs.cluster_name, "ECS backend enabled");
            Arc::new(AwsEcsBackend::new(sdk.clone(), ecs.clone()))
        }
        _ => Arc::new(DisabledEcs),
    }
}
