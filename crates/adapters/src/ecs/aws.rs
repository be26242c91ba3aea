// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{classify_service, EcsBackend, EcsError, EcsLaunch};
use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_config::SdkConfig;
use aws_sdk_ecs::config::Region;
use aws_sdk_ecs::types::{
    AssignPublicIp, AwsVpcConfiguration, Compatibility, ContainerDefinition, KeyValuePair,
    LaunchType, NetworkConfiguration, NetworkMode, PortMapping,
};
use aws_sdk_ecs::Client;
use hatch_core::{resource_name, EcsConfig, PayModel, Quantity, ResourceKind, WorkspaceStatus};

/// Memory choices per Fargate CPU tier: (cpu units, min MiB, max MiB, step MiB).
/// The 256-unit tier is irregular and handled separately.
const FARGATE_TIERS: [(i64, i64, i64, i64); 6] = [
    (512, 1024, 4096, 1024),
    (1024, 2048, 8192, 1024),
    (2048, 4096, 16384, 1024),
    (4096, 8192, 30720, 1024),
    (8192, 16384, 61440, 4096),
    (16384, 32768, 122880, 8192),
];

const SMALLEST_TIER_MEMORY: [i64; 3] = [512, 1024, 2048];

/// Smallest valid Fargate (cpu, memory) pair covering the request.
pub(crate) fn fargate_size(cpu_units: i64, memory_mib: i64) -> Option<(i64, i64)> {
    if cpu_units <= 256 {
        if let Some(memory) = SMALLEST_TIER_MEMORY.into_iter().find(|m| *m >= memory_mib) {
            return Some((256, memory));
        }
    }
    FARGATE_TIERS.iter().filter(|(cpu, ..)| *cpu >= cpu_units).find_map(|&(cpu, min, max, step)| {
        if memory_mib > max {
            return None;
        }
        let memory =
            if memory_mib <= min { min } else { min + (memory_mib - min + step - 1) / step * step };
        Some((cpu, memory))
    })
}

/// [`EcsBackend`] that assumes a role in each pay model's account.
#[derive(Clone)]
pub struct AwsEcsBackend {
    base: SdkConfig,
    config: EcsConfig,
}

impl AwsEcsBackend {
    pub fn new(base: SdkConfig, config: EcsConfig) -> Self {
        Self { base, config }
    }

    async fn client(&self, pay_model: &PayModel) -> Client {
        let role_arn = format!("arn:aws:iam::{}:role/{}", pay_model.account_id, self.config.role_name);
        let region = if pay_model.region.is_empty() {
            self.base.region().cloned()
        } else {
            Some(Region::new(pay_model.region.clone()))
        };

        let mut provider = AssumeRoleProvider::builder(role_arn).session_name("hatchery");
        if let Some(region) = region.clone() {
            provider = provider.region(region);
        }
        let provider = provider.configure(&self.base).build().await;

        let conf = aws_sdk_ecs::config::Builder::from(&self.base)
            .credentials_provider(provider)
            .region(region)
            .build();
        Client::from_conf(conf)
    }

    async fn describe(
        &self,
        client: &Client,
        service: &str,
    ) -> Result<Option<aws_sdk_ecs::types::Service>, EcsError> {
        let out = client
            .describe_services()
            .cluster(&self.config.cluster_name)
            .services(service)
            .send()
            .await
            .map_err(|e| EcsError::Request(e.to_string()))?;
        Ok(out.services().first().cloned())
    }

    async fn register_task(&self, client: &Client, request: &EcsLaunch) -> Result<String, EcsError> {
        let c = &request.container;
        let size_error = || EcsError::Size { cpu: c.cpu_limit.clone(), memory: c.memory_limit.clone() };
        let cpu = Quantity::parse(&c.cpu_limit).map_err(|_| size_error())?;
        let memory = Quantity::parse(&c.memory_limit).map_err(|_| size_error())?;
        let (cpu, memory) = fargate_size(cpu.cpu_units(), memory.mebibytes()).ok_or_else(size_error)?;

        let mut env = environment(&c.env)?;
        env.extend(request.env.iter().map(|(k, v)| pair(k, v)));

        let definition = ContainerDefinition::builder()
            .name(resource_name(&request.user, ResourceKind::Pod))
            .image(&c.image)
            .essential(true)
            .port_mappings(PortMapping::builder().container_port(c.target_port).build())
            .set_environment(Some(env))
            .set_command((!c.command.is_empty()).then(|| c.command.clone()))
            .build();

        let out = client
            .register_task_definition()
            .family(resource_name(&request.user, ResourceKind::Pod))
            .requires_compatibilities(Compatibility::Fargate)
            .network_mode(NetworkMode::Awsvpc)
            .cpu(cpu.to_string())
            .memory(memory.to_string())
            .set_execution_role_arn(self.config.execution_role_arn.clone())
            .container_definitions(definition)
            .send()
            .await
            .map_err(|e| EcsError::Request(e.to_string()))?;

        out.task_definition()
            .and_then(|td| td.task_definition_arn())
            .map(str::to_string)
            .ok_or_else(|| EcsError::Request("task definition has no ARN".to_string()))
    }

    fn network(&self) -> Result<NetworkConfiguration, EcsError> {
        let assign = if self.config.assign_public_ip {
            AssignPublicIp::Enabled
        } else {
            AssignPublicIp::Disabled
        };
        let vpc = AwsVpcConfiguration::builder()
            .set_subnets(Some(self.config.subnets.clone()))
            .set_security_groups(Some(self.config.security_groups.clone()))
            .assign_public_ip(assign)
            .build()
            .map_err(|e| EcsError::Request(e.to_string()))?;
        Ok(NetworkConfiguration::builder().awsvpc_configuration(vpc).build())
    }
}

/// Descriptor `KEY=VALUE` entries as ECS key/value pairs.
pub(crate) fn environment(entries: &[String]) -> Result<Vec<KeyValuePair>, EcsError> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok(pair(name, value)),
            _ => Err(EcsError::Env(entry.clone())),
        })
        .collect()
}

fn pair(name: &str, value: &str) -> KeyValuePair {
    KeyValuePair::builder().name(name).value(value).build()
}

#[async_trait]
impl EcsBackend for AwsEcsBackend {
    async fn launch(&self, request: EcsLaunch) -> Result<String, EcsError> {
        let client = self.client(&request.pay_model).await;
        let service = resource_name(&request.user, ResourceKind::Pod);

        client
            .create_cluster()
            .cluster_name(&self.config.cluster_name)
            .send()
            .await
            .map_err(|e| EcsError::Request(e.to_string()))?;

        let task = self.register_task(&client, &request).await?;

        let existing = self.describe(&client, &service).await?;
        let active = existing.as_ref().and_then(|s| s.status()).is_some_and(|s| s != "INACTIVE");
        let out_arn = if active {
            let out = client
                .update_service()
                .cluster(&self.config.cluster_name)
                .service(&service)
                .task_definition(&task)
                .desired_count(1)
                .force_new_deployment(true)
                .send()
                .await
                .map_err(|e| EcsError::Request(e.to_string()))?;
            out.service().and_then(|s| s.service_arn()).map(str::to_string)
        } else {
            let out = client
                .create_service()
                .cluster(&self.config.cluster_name)
                .service_name(&service)
                .task_definition(&task)
                .desired_count(1)
                .launch_type(LaunchType::Fargate)
                .network_configuration(self.network()?)
                .send()
                .await
                .map_err(|e| EcsError::Request(e.to_string()))?;
            out.service().and_then(|s| s.service_arn()).map(str::to_string)
        };

        let arn = out_arn.unwrap_or(service);
        tracing::info!(user = %request.user, %arn, %task, "ECS workspace launched");
        Ok(arn)
    }

    async fn terminate(&self, user: &str, pay_model: &PayModel) -> Result<String, EcsError> {
        let client = self.client(pay_model).await;
        let service = resource_name(user, ResourceKind::Pod);

        let existing = self.describe(&client, &service).await?;
        let status = existing.as_ref().and_then(|s| s.status());
        if matches!(status, None | Some("INACTIVE")) {
            return Err(EcsError::NotFound(user.to_string()));
        }

        client
            .update_service()
            .cluster(&self.config.cluster_name)
            .service(&service)
            .desired_count(0)
            .send()
            .await
            .map_err(|e| EcsError::Request(e.to_string()))?;
        let out = client
            .delete_service()
            .cluster(&self.config.cluster_name)
            .service(&service)
            .force(true)
            .send()
            .await
            .map_err(|e| EcsError::Request(e.to_string()))?;

        let arn = out.service().and_then(|s| s.service_arn()).unwrap_or(&service).to_string();
        tracing::info!(%user, %arn, "ECS workspace terminated");
        Ok(arn)
    }

    async fn status(&self, user: &str, pay_model: &PayModel) -> Result<WorkspaceStatus, EcsError> {
        let client = self.client(pay_model).await;
        let service = resource_name(user, ResourceKind::Pod);
        let existing = self.describe(&client, &service).await?;
        let status = match &existing {
            Some(s) => classify_service(s.status(), s.desired_count(), s.running_count()),
            None => classify_service(None, 0, 0),
        };
        Ok(WorkspaceStatus::new(status))
    }
}
