//! Shared harness for workspace specs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub use axum::http::{Method, StatusCode};
pub use hatch_adapters::{EcsCall, FakeEcsBackend, FakeK8sBackend, FakePayModelStore, K8sCall};
pub use hatch_core::{test_support, Container, HatcheryConfig, PayModel, Status};

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use hatch_adapters::K8sBackend;
use hatch_engine::{Hatchery, HatcheryDeps};
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const ACCOUNT: &str = "123456789012";

/// Router wired to fakes, with handles to inspect them.
pub struct Spec {
    pub router: Router,
    pub hatchery: Hatchery,
    pub local: FakeK8sBackend,
    pub external: FakeK8sBackend,
    pub store: FakePayModelStore,
    pub ecs: FakeEcsBackend,
}

pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

impl Spec {
    pub fn new() -> Self {
        Self::with_config(test_support::config())
    }

    pub fn with_config(config: HatcheryConfig) -> Self {
        let local = FakeK8sBackend::new();
        let external = FakeK8sBackend::with_namespace("billing-pods");
        let store = FakePayModelStore::new();
        let ecs = FakeEcsBackend::new();
        let deps = HatcheryDeps {
            local: Arc::new(local.clone()),
            external: HashMap::from([(
                ACCOUNT.to_string(),
                Arc::new(external.clone()) as Arc<dyn K8sBackend>,
            )]),
            pay_models: Arc::new(store.clone()),
            ecs: Arc::new(ecs.clone()),
        };
        let hatchery = Hatchery::new(Arc::new(config), deps).unwrap();
        Self {
            router: hatch_daemon::router(hatchery.clone()),
            hatchery,
            local,
            external,
            store,
            ecs,
        }
    }

    pub async fn call(&self, method: Method, uri: &str, user: Option<&str>) -> Reply {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header("REMOTE_USER", user);
        }
        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        Reply { status, body: String::from_utf8(bytes.to_vec()).unwrap() }
    }

    pub async fn post(&self, uri: &str, user: &str) -> Reply {
        self.call(Method::POST, uri, Some(user)).await
    }

    pub async fn get(&self, uri: &str, user: &str) -> Reply {
        self.call(Method::GET, uri, Some(user)).await
    }

    /// Wait for background tasks (ECS launches, teardown polls) to finish.
    pub async fn settle(&self) {
        assert!(self.hatchery.tasks().drain(Duration::from_secs(5)).await, "background tasks hung");
    }
}
