// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hatchery daemon library
//!
//! Exposes the HTTP router and startup wiring so the `hatcheryd` binary and
//! workspace-level tests share one code path.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
pub mod listener;
pub mod logging;

pub use lifecycle::{load_config, run, startup, Config, LifecycleError};
pub use listener::{router, ApiError};
