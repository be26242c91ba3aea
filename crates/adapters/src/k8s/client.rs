// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{K8sBackend, KubeError};
use crate::mapper::mapping_resource;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, DynamicObject, Patch, PatchParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;

const FIELD_MANAGER: &str = "hatchery";

/// [`K8sBackend`] over a live API server.
#[derive(Clone)]
pub struct KubeBackend {
    client: Client,
    namespace: String,
}

impl KubeBackend {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self { client, namespace: namespace.into() }
    }

    /// In-cluster service account, falling back to the local kubeconfig.
    pub async fn try_default(namespace: impl Into<String>) -> Result<Self, KubeError> {
        let client = Client::try_default().await.map_err(|e| KubeError::Client(e.to_string()))?;
        Ok(Self::new(client, namespace))
    }

    /// Client for a cluster described by a kubeconfig file.
    pub async fn from_kubeconfig(
        path: &Path,
        context: Option<String>,
        namespace: impl Into<String>,
    ) -> Result<Self, KubeError> {
        let kubeconfig = Kubeconfig::read_from(path)
            .map_err(|e| KubeError::Client(format!("{}: {e}", path.display())))?;
        let options = KubeConfigOptions { context, ..Default::default() };
        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| KubeError::Client(format!("{}: {e}", path.display())))?;
        let client = Client::try_from(config).map_err(|e| KubeError::Client(e.to_string()))?;
        Ok(Self::new(client, namespace))
    }

    fn api<K>(&self) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    async fn get<K>(&self, kind: &'static str, name: &str) -> Result<Option<K>, KubeError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        self.api::<K>().get_opt(name).await.map_err(|e| request_error("get", kind, name, e))
    }

    async fn create<K>(&self, kind: &'static str, object: &K) -> Result<(), KubeError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        K::DynamicType: Default,
    {
        let name = object.name_any();
        self.api::<K>()
            .create(&PostParams::default(), object)
            .await
            .map_err(|e| request_error("create", kind, &name, e))?;
        tracing::info!(namespace = %self.namespace, %kind, %name, "created");
        Ok(())
    }

    async fn delete<K>(
        &self,
        kind: &'static str,
        name: &str,
        grace_seconds: Option<u32>,
    ) -> Result<(), KubeError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let mut params = DeleteParams::background();
        if let Some(grace) = grace_seconds {
            params = params.grace_period(grace);
        }
        self.api::<K>()
            .delete(name, &params)
            .await
            .map_err(|e| request_error("delete", kind, name, e))?;
        tracing::info!(namespace = %self.namespace, %kind, %name, "deleted");
        Ok(())
    }
}

fn request_error(op: &'static str, kind: &'static str, name: &str, e: kube::Error) -> KubeError {
    KubeError::Request { op, kind, name: name.to_string(), reason: e.to_string() }
}

#[async_trait]
impl K8sBackend for KubeBackend {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, KubeError> {
        self.get("pod", name).await
    }

    async fn create_pod(&self, pod: &Pod) -> Result<(), KubeError> {
        self.create("pod", pod).await
    }

    async fn delete_pod(&self, name: &str, grace_seconds: Option<u32>) -> Result<(), KubeError> {
        self.delete::<Pod>("pod", name, grace_seconds).await
    }

    async fn get_service(&self, name: &str) -> Result<Option<Service>, KubeError> {
        self.get("service", name).await
    }

    async fn create_service(&self, service: &Service) -> Result<(), KubeError> {
        self.create("service", service).await
    }

    async fn delete_service(
        &self,
        name: &str,
        grace_seconds: Option<u32>,
    ) -> Result<(), KubeError> {
        self.delete::<Service>("service", name, grace_seconds).await
    }

    async fn get_claim(&self, name: &str) -> Result<Option<PersistentVolumeClaim>, KubeError> {
        self.get("claim", name).await
    }

    async fn create_claim(&self, claim: &PersistentVolumeClaim) -> Result<(), KubeError> {
        self.create("claim", claim).await
    }

    async fn apply_mapping(&self, mapping: &DynamicObject) -> Result<(), KubeError> {
        let name = mapping.name_any();
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &self.namespace, &mapping_resource());
        api.patch(&name, &PatchParams::apply(FIELD_MANAGER).force(), &Patch::Apply(mapping))
            .await
            .map_err(|e| request_error("apply", "mapping", &name, e))?;
        tracing::info!(namespace = %self.namespace, %name, "applied service mapping");
        Ok(())
    }
}
