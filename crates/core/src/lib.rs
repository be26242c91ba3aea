// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hatch-core: Shared types for the hatchery workspace controller

pub mod macros;

pub mod config;
pub mod container;
pub mod naming;
pub mod paymodel;
pub mod quantity;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{
    ConfigError, EcsConfig, ExternalCluster, HatcheryConfig, MapperSettings, ServiceMapperConfig,
    SidecarConfig,
};
#[cfg(any(test, feature = "test-support"))]
pub use container::ContainerBuilder;
pub use container::{AppOption, Container, PullPolicy};
pub use naming::{escape, resource_name, ResourceKind};
#[cfg(any(test, feature = "test-support"))]
pub use paymodel::PayModelBuilder;
pub use paymodel::{AllPayModels, BackendKind, PayModel};
pub use quantity::{Quantity, QuantityError};
pub use status::{ContainerReadiness, PodCondition, Status, WorkspaceStatus};
