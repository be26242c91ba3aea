// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hatch-engine: Workspace lifecycle controller
//!
//! Builds Kubernetes object graphs for a user's workspace, infers status from
//! live backend state, dispatches launch/terminate by pay model, and waits for
//! teardown before releasing the pay-model lock.

mod error;
mod tasks;

pub mod dispatch;
pub mod lifecycle;
pub mod pod;
pub mod reconcile;
pub mod status;

pub use dispatch::{Hatchery, HatcheryDeps, LaunchOutcome, TerminateOutcome};
pub use error::{ErrorKind, HatcheryError};
pub use lifecycle::LifecycleManager;
pub use pod::{build_claim, build_pod, build_service, parse_env, validate_container, BuildError, PodParams};
pub use reconcile::{await_teardown, ReconcileReport, StatusProbe};
pub use status::{classify_pod, is_ready, pod_status};
pub use tasks::BackgroundTasks;
