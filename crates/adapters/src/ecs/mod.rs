// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AWS ECS workspaces, run in the pay model's own account.

mod aws;

pub use aws::AwsEcsBackend;

use async_trait::async_trait;
use hatch_core::{Container, PayModel, Status, WorkspaceStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EcsError {
    #[error("ECS backend is not configured")]
    NotConfigured,
    #[error("no ECS workspace found for user {0}")]
    NotFound(String),
    #[error("no Fargate size fits cpu {cpu} / memory {memory}")]
    Size { cpu: String, memory: String },
    #[error("invalid environment entry {0:?}, expected KEY=VALUE")]
    Env(String),
    #[error("ECS request failed: {0}")]
    Request(String),
}

/// Everything needed to start a workspace; owned so it can outlive the request.
#[derive(Debug, Clone)]
pub struct EcsLaunch {
    pub user: String,
    pub container: Container,
    pub pay_model: PayModel,
    pub env: Vec<(String, String)>,
}

/// Launch/terminate/status for ECS workspaces, keyed by user and account.
#[async_trait]
pub trait EcsBackend: Send + Sync + 'static {
    /// Start the workspace; returns the ECS service ARN.
    async fn launch(&self, request: EcsLaunch) -> Result<String, EcsError>;
    /// Stop the workspace; returns a description of what was removed.
    async fn terminate(&self, user: &str, pay_model: &PayModel) -> Result<String, EcsError>;
    async fn status(&self, user: &str, pay_model: &PayModel) -> Result<WorkspaceStatus, EcsError>;
}

/// Map an ECS service's state onto the workspace vocabulary.
///
/// `status` is `None` when the service does not exist.
pub fn classify_service(status: Option<&str>, desired: i32, running: i32) -> Status {
    match status {
        None | Some("INACTIVE") => Status::NotFound,
        Some("DRAINING") => Status::Terminating,
        Some(_) if desired == 0 => Status::Terminating,
        Some(_) if running >= desired => Status::Running,
        Some(_) => Status::Launching,
    }
}

/// Backend used when no `ecs` section is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledEcs;

#[async_trait]
impl EcsBackend for DisabledEcs {
    async fn launch(&self, _request: EcsLaunch) -> Result<String, EcsError> {
        Err(EcsError::NotConfigured)
    }

    async fn terminate(&self, _user: &str, _pay_model: &PayModel) -> Result<String, EcsError> {
        Err(EcsError::NotConfigured)
    }

    async fn status(&self, _user: &str, _pay_model: &PayModel) -> Result<WorkspaceStatus, EcsError> {
        Err(EcsError::NotConfigured)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{EcsBackend, EcsError, EcsLaunch};
    use async_trait::async_trait;
    use hatch_core::{PayModel, Status, WorkspaceStatus};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Recorded backend call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum EcsCall {
        Launch { user: String, account_id: String },
        LaunchFinished { user: String },
        Terminate { user: String, account_id: String },
        Status { user: String, account_id: String },
    }

    struct FakeEcsState {
        status: Status,
        status_script: VecDeque<Status>,
        hold_launches: bool,
        fail_terminate: bool,
        launches: Vec<EcsLaunch>,
        calls: Vec<EcsCall>,
    }

    /// Scriptable ECS backend
    #[derive(Clone)]
    pub struct FakeEcsBackend {
        inner: Arc<Mutex<FakeEcsState>>,
        gate: Arc<Notify>,
    }

    impl Default for FakeEcsBackend {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeEcsState {
                    status: Status::NotFound,
                    status_script: VecDeque::new(),
                    hold_launches: false,
                    fail_terminate: false,
                    launches: Vec::new(),
                    calls: Vec::new(),
                })),
                gate: Arc::new(Notify::new()),
            }
        }
    }

    impl FakeEcsBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Status reported once any scripted statuses are used up
        pub fn set_status(&self, status: Status) {
            self.inner.lock().status = status;
        }

        pub fn script_statuses(&self, statuses: impl IntoIterator<Item = Status>) {
            self.inner.lock().status_script.extend(statuses);
        }

        /// Block launches until [`release_launch`](Self::release_launch) is called.
        pub fn hold_launches(&self) {
            self.inner.lock().hold_launches = true;
        }

        pub fn release_launch(&self) {
            self.gate.notify_one();
        }

        pub fn fail_terminate(&self) {
            self.inner.lock().fail_terminate = true;
        }

        pub fn launches(&self) -> Vec<EcsLaunch> {
            self.inner.lock().launches.clone()
        }

        pub fn calls(&self) -> Vec<EcsCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl EcsBackend for FakeEcsBackend {
        async fn launch(&self, request: EcsLaunch) -> Result<String, EcsError> {
            let user = request.user.clone();
            let held = {
                let mut state = self.inner.lock();
                state.calls.push(EcsCall::Launch {
                    user: user.clone(),
                    account_id: request.pay_model.account_id.clone(),
                });
                state.launches.push(request);
                state.hold_launches
            };
            if held {
                self.gate.notified().await;
            }
            let mut state = self.inner.lock();
            state.calls.push(EcsCall::LaunchFinished { user: user.clone() });
            state.status = Status::Launching;
            Ok(format!("arn:aws:ecs:fake:service/hatchery/{user}"))
        }

        async fn terminate(&self, user: &str, pay_model: &PayModel) -> Result<String, EcsError> {
            let mut state = self.inner.lock();
            state.calls.push(EcsCall::Terminate {
                user: user.to_string(),
                account_id: pay_model.account_id.clone(),
            });
            if state.fail_terminate {
                return Err(EcsError::NotFound(user.to_string()));
            }
            Ok(format!("arn:aws:ecs:fake:service/hatchery/{user}"))
        }

        async fn status(&self, user: &str, pay_model: &PayModel) -> Result<WorkspaceStatus, EcsError> {
            let mut state = self.inner.lock();
            state.calls.push(EcsCall::Status {
                user: user.to_string(),
                account_id: pay_model.account_id.clone(),
            });
            let status = state.status_script.pop_front().unwrap_or(state.status);
            Ok(WorkspaceStatus::new(status))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{EcsCall, FakeEcsBackend};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
