// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

const DEFAULT_CONFIG: &str = "/etc/hatchery/hatchery.json";
const DEFAULT_LISTEN: &str = "0.0.0.0:8000";

/// Configuration file path (`HATCHERY_CONFIG`)
pub fn config_path() -> PathBuf {
    std::env::var("HATCHERY_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

/// Bind address for the HTTP surface (`HATCHERY_LISTEN`)
pub fn listen_addr() -> Result<SocketAddr, LifecycleError> {
    let raw = std::env::var("HATCHERY_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.to_string());
    raw.parse().map_err(|_| LifecycleError::BadListenAddr(raw))
}

/// Shutdown drain timeout (default 5s, configurable via `HATCHERY_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    std::env::var("HATCHERY_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Directory for daily-rolling log files; stdout when unset
pub fn log_dir() -> Option<PathBuf> {
    std::env::var("HATCHERY_LOG_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
