// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hatch-adapters: Backends the workspace controller talks to
//!
//! Each collaborator is a capability trait with one real implementation and,
//! behind the `test-support` feature, an in-memory fake that records calls.

pub mod ecs;
pub mod k8s;
pub mod mapper;
pub mod paymodel;

pub use ecs::{classify_service, AwsEcsBackend, DisabledEcs, EcsBackend, EcsError, EcsLaunch};
pub use k8s::{K8sBackend, KubeBackend, KubeError};
pub use mapper::{mapping_resource, MapperError, ServiceMapper};
pub use paymodel::{DynamoPayModelStore, NoPayModels, PayModelError, PayModelStore};

#[cfg(any(test, feature = "test-support"))]
pub use ecs::{EcsCall, FakeEcsBackend};
#[cfg(any(test, feature = "test-support"))]
pub use k8s::{FakeK8sBackend, K8sCall};
#[cfg(any(test, feature = "test-support"))]
pub use paymodel::{FakePayModelStore, PayModelCall};
