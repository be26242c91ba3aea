// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes API access for workspace objects in one namespace.

mod client;

pub use client::KubeBackend;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Service};
use kube::api::DynamicObject;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KubeError {
    #[error("failed to create kube client: {0}")]
    Client(String),
    #[error("{op} {kind} {name} failed: {reason}")]
    Request { op: &'static str, kind: &'static str, name: String, reason: String },
}

/// Namespaced get/create/delete for the objects that make up a workspace.
///
/// Lookups return `Ok(None)` when the object does not exist; only transport
/// and API failures are errors.
#[async_trait]
pub trait K8sBackend: Send + Sync + 'static {
    fn namespace(&self) -> &str;

    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, KubeError>;
    async fn create_pod(&self, pod: &Pod) -> Result<(), KubeError>;
    /// Background-propagation delete, optionally with a grace period
    async fn delete_pod(&self, name: &str, grace_seconds: Option<u32>) -> Result<(), KubeError>;

    async fn get_service(&self, name: &str) -> Result<Option<Service>, KubeError>;
    async fn create_service(&self, service: &Service) -> Result<(), KubeError>;
    async fn delete_service(&self, name: &str, grace_seconds: Option<u32>)
        -> Result<(), KubeError>;

    async fn get_claim(&self, name: &str) -> Result<Option<PersistentVolumeClaim>, KubeError>;
    async fn create_claim(&self, claim: &PersistentVolumeClaim) -> Result<(), KubeError>;

    /// Server-side apply of a gateway mapping object
    async fn apply_mapping(&self, mapping: &DynamicObject) -> Result<(), KubeError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{K8sBackend, KubeError};
    use async_trait::async_trait;
    use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Service};
    use kube::api::DynamicObject;
    use kube::ResourceExt;
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, HashSet, VecDeque};
    use std::sync::Arc;

    /// Recorded backend call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum K8sCall {
        GetPod(String),
        CreatePod(String),
        DeletePod { name: String, grace_seconds: Option<u32> },
        GetService(String),
        CreateService(String),
        DeleteService { name: String, grace_seconds: Option<u32> },
        GetClaim(String),
        CreateClaim(String),
        ApplyMapping(String),
    }

    struct FakeK8sState {
        pods: BTreeMap<String, Pod>,
        services: BTreeMap<String, Service>,
        claims: BTreeMap<String, PersistentVolumeClaim>,
        mappings: BTreeMap<String, DynamicObject>,
        pod_script: VecDeque<Option<Pod>>,
        failing: HashSet<&'static str>,
        calls: Vec<K8sCall>,
    }

    impl FakeK8sState {
        fn check(&self, op: &'static str, kind: &'static str, name: &str) -> Result<(), KubeError> {
            if self.failing.contains(op) {
                return Err(KubeError::Request {
                    op,
                    kind,
                    name: name.to_string(),
                    reason: "injected failure".to_string(),
                });
            }
            Ok(())
        }
    }

    /// In-memory cluster namespace
    #[derive(Clone)]
    pub struct FakeK8sBackend {
        namespace: Arc<str>,
        inner: Arc<Mutex<FakeK8sState>>,
    }

    impl Default for FakeK8sBackend {
        fn default() -> Self {
            Self::with_namespace("jupyter-pods")
        }
    }

    impl FakeK8sBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_namespace(namespace: &str) -> Self {
            Self {
                namespace: Arc::from(namespace),
                inner: Arc::new(Mutex::new(FakeK8sState {
                    pods: BTreeMap::new(),
                    services: BTreeMap::new(),
                    claims: BTreeMap::new(),
                    mappings: BTreeMap::new(),
                    pod_script: VecDeque::new(),
                    failing: HashSet::new(),
                    calls: Vec::new(),
                })),
            }
        }

        pub fn insert_pod(&self, pod: Pod) {
            self.inner.lock().pods.insert(pod.name_any(), pod);
        }

        pub fn insert_service(&self, service: Service) {
            self.inner.lock().services.insert(service.name_any(), service);
        }

        pub fn insert_claim(&self, claim: PersistentVolumeClaim) {
            self.inner.lock().claims.insert(claim.name_any(), claim);
        }

        /// Queue results for upcoming `get_pod` calls; once drained, lookups
        /// read the stored pods again.
        pub fn script_pod_lookups(&self, results: impl IntoIterator<Item = Option<Pod>>) {
            self.inner.lock().pod_script.extend(results);
        }

        /// Make every call of `op` (a trait method name) fail.
        pub fn fail(&self, op: &'static str) {
            self.inner.lock().failing.insert(op);
        }

        pub fn calls(&self) -> Vec<K8sCall> {
            self.inner.lock().calls.clone()
        }

        pub fn pod(&self, name: &str) -> Option<Pod> {
            self.inner.lock().pods.get(name).cloned()
        }

        pub fn service(&self, name: &str) -> Option<Service> {
            self.inner.lock().services.get(name).cloned()
        }

        pub fn claim(&self, name: &str) -> Option<PersistentVolumeClaim> {
            self.inner.lock().claims.get(name).cloned()
        }

        pub fn mapping(&self, name: &str) -> Option<DynamicObject> {
            self.inner.lock().mappings.get(name).cloned()
        }

        pub fn pod_names(&self) -> Vec<String> {
            self.inner.lock().pods.keys().cloned().collect()
        }
    }

    #[async_trait]
    impl K8sBackend for FakeK8sBackend {
        fn namespace(&self) -> &str {
            &self.namespace
        }

        async fn get_pod(&self, name: &str) -> Result<Option<Pod>, KubeError> {
            let mut state = self.inner.lock();
            state.calls.push(K8sCall::GetPod(name.to_string()));
            state.check("get_pod", "pod", name)?;
            if let Some(scripted) = state.pod_script.pop_front() {
                return Ok(scripted);
            }
            Ok(state.pods.get(name).cloned())
        }

        async fn create_pod(&self, pod: &Pod) -> Result<(), KubeError> {
            let name = pod.name_any();
            let mut state = self.inner.lock();
            state.calls.push(K8sCall::CreatePod(name.clone()));
            state.check("create_pod", "pod", &name)?;
            state.pods.insert(name, pod.clone());
            Ok(())
        }

        async fn delete_pod(&self, name: &str, grace_seconds: Option<u32>) -> Result<(), KubeError> {
            let mut state = self.inner.lock();
            state.calls.push(K8sCall::DeletePod { name: name.to_string(), grace_seconds });
            state.check("delete_pod", "pod", name)?;
            state.pods.remove(name);
            Ok(())
        }

        async fn get_service(&self, name: &str) -> Result<Option<Service>, KubeError> {
            let mut state = self.inner.lock();
            state.calls.push(K8sCall::GetService(name.to_string()));
            state.check("get_service", "service", name)?;
            Ok(state.services.get(name).cloned())
        }

        async fn create_service(&self, service: &Service) -> Result<(), KubeError> {
            let name = service.name_any();
            let mut state = self.inner.lock();
            state.calls.push(K8sCall::CreateService(name.clone()));
            state.check("create_service", "service", &name)?;
            state.services.insert(name, service.clone());
            Ok(())
        }

        async fn delete_service(
            &self,
            name: &str,
            grace_seconds: Option<u32>,
        ) -> Result<(), KubeError> {
            let mut state = self.inner.lock();
            state.calls.push(K8sCall::DeleteService { name: name.to_string(), grace_seconds });
            state.check("delete_service", "service", name)?;
            state.services.remove(name);
            Ok(())
        }

        async fn get_claim(&self, name: &str) -> Result<Option<PersistentVolumeClaim>, KubeError> {
            let mut state = self.inner.lock();
            state.calls.push(K8sCall::GetClaim(name.to_string()));
            state.check("get_claim", "claim", name)?;
            Ok(state.claims.get(name).cloned())
        }

        async fn create_claim(&self, claim: &PersistentVolumeClaim) -> Result<(), KubeError> {
            let name = claim.name_any();
            let mut state = self.inner.lock();
            state.calls.push(K8sCall::CreateClaim(name.clone()));
            state.check("create_claim", "claim", &name)?;
            state.claims.insert(name, claim.clone());
            Ok(())
        }

        async fn apply_mapping(&self, mapping: &DynamicObject) -> Result<(), KubeError> {
            let name = mapping.name_any();
            let mut state = self.inner.lock();
            state.calls.push(K8sCall::ApplyMapping(name.clone()));
            state.check("apply_mapping", "mapping", &name)?;
            state.mappings.insert(name, mapping.clone());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeK8sBackend, K8sCall};
