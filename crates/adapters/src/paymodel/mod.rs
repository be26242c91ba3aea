// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pay-model store: the external record of which backend a user runs on.

mod dynamo;

pub use dynamo::DynamoPayModelStore;

use async_trait::async_trait;
use hatch_core::{AllPayModels, PayModel};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayModelError {
    #[error("pay model store is not configured")]
    NotConfigured,
    #[error("pay model {id} not found for user {user}")]
    NotFound { user: String, id: String },
    #[error("pay model store request failed: {0}")]
    Store(String),
    #[error("malformed pay model record: {0}")]
    Malformed(String),
}

/// Read all / set current / reset current.
///
/// The controller relies on the store for atomicity of each individual call
/// and does no locking of its own.
#[async_trait]
pub trait PayModelStore: Send + Sync + 'static {
    /// All pay models of `user`, or `None` when the user has none.
    async fn pay_models(&self, user: &str) -> Result<Option<AllPayModels>, PayModelError>;

    async fn current_pay_model(&self, user: &str) -> Result<Option<PayModel>, PayModelError> {
        Ok(self.pay_models(user).await?.and_then(|all| all.current_pay_model))
    }

    /// Mark `id` as the user's current pay model and return it.
    async fn set_current(&self, user: &str, id: &str) -> Result<PayModel, PayModelError>;

    /// Clear the current flag on every pay model of `user`.
    async fn reset_current(&self, user: &str) -> Result<(), PayModelError>;
}

/// Store used when no pay-model table is configured: every user runs locally.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPayModels;

#[async_trait]
impl PayModelStore for NoPayModels {
    async fn pay_models(&self, _user: &str) -> Result<Option<AllPayModels>, PayModelError> {
        Ok(None)
    }

    async fn set_current(&self, _user: &str, _id: &str) -> Result<PayModel, PayModelError> {
        Err(PayModelError::NotConfigured)
    }

    async fn reset_current(&self, _user: &str) -> Result<(), PayModelError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{PayModelError, PayModelStore};
    use async_trait::async_trait;
    use hatch_core::{AllPayModels, PayModel};
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    /// Recorded store call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PayModelCall {
        PayModels(String),
        SetCurrent { user: String, id: String },
        ResetCurrent(String),
    }

    #[derive(Default)]
    struct FakePayModelState {
        models: BTreeMap<String, Vec<PayModel>>,
        calls: Vec<PayModelCall>,
        fail_reset: bool,
    }

    /// In-memory pay-model table keyed by user
    #[derive(Clone, Default)]
    pub struct FakePayModelStore {
        inner: Arc<Mutex<FakePayModelState>>,
    }

    impl FakePayModelStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, model: PayModel) {
            self.inner.lock().models.entry(model.user_id.clone()).or_default().push(model);
        }

        pub fn fail_reset(&self) {
            self.inner.lock().fail_reset = true;
        }

        pub fn models(&self, user: &str) -> Vec<PayModel> {
            self.inner.lock().models.get(user).cloned().unwrap_or_default()
        }

        pub fn calls(&self) -> Vec<PayModelCall> {
            self.inner.lock().calls.clone()
        }

        /// Number of calls that could change store state
        pub fn write_count(&self) -> usize {
            self.calls().iter().filter(|c| !matches!(c, PayModelCall::PayModels(_))).count()
        }

        pub fn reset_count(&self) -> usize {
            self.calls().iter().filter(|c| matches!(c, PayModelCall::ResetCurrent(_))).count()
        }
    }

    #[async_trait]
    impl PayModelStore for FakePayModelStore {
        async fn pay_models(&self, user: &str) -> Result<Option<AllPayModels>, PayModelError> {
            let mut state = self.inner.lock();
            state.calls.push(PayModelCall::PayModels(user.to_string()));
            Ok(state
                .models
                .get(user)
                .filter(|models| !models.is_empty())
                .map(|models| AllPayModels::from_models(models.clone())))
        }

        async fn set_current(&self, user: &str, id: &str) -> Result<PayModel, PayModelError> {
            let mut state = self.inner.lock();
            state.calls.push(PayModelCall::SetCurrent { user: user.to_string(), id: id.to_string() });
            let models = state.models.entry(user.to_string()).or_default();
            if !models.iter().any(|m| m.id == id) {
                return Err(PayModelError::NotFound { user: user.to_string(), id: id.to_string() });
            }
            let mut chosen = None;
            for model in models.iter_mut() {
                model.current = model.id == id;
                if model.current {
                    chosen = Some(model.clone());
                }
            }
            chosen.ok_or_else(|| PayModelError::NotFound { user: user.to_string(), id: id.to_string() })
        }

        async fn reset_current(&self, user: &str) -> Result<(), PayModelError> {
            let mut state = self.inner.lock();
            state.calls.push(PayModelCall::ResetCurrent(user.to_string()));
            if state.fail_reset {
                return Err(PayModelError::Store("injected failure".to_string()));
            }
            for model in state.models.entry(user.to_string()).or_default().iter_mut() {
                model.current = false;
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePayModelStore, PayModelCall};
