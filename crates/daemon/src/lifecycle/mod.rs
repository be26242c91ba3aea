// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, serving, shutdown.

mod startup;
pub use startup::{load_config, startup};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use hatch_adapters::KubeError;
use hatch_core::ConfigError;
use hatch_engine::{Hatchery, HatcheryError};
use thiserror::Error;
use tracing::{info, warn};

/// Daemon configuration, resolved from the process environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the hatchery configuration file
    pub config_path: PathBuf,
    /// HTTP bind address
    pub listen: SocketAddr,
    /// How long shutdown waits for background tasks
    pub drain_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self {
            config_path: crate::env::config_path(),
            listen: crate::env::listen_addr()?,
            drain_timeout: crate::env::drain_timeout(),
        })
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid listen address {0:?}")]
    BadListenAddr(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("kubernetes client error: {0}")]
    Kube(#[from] KubeError),

    #[error("startup error: {0}")]
    Hatchery(#[from] HatcheryError),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serve the HTTP surface until SIGINT/SIGTERM, then drain background tasks.
pub async fn run(config: &Config, hatchery: Hatchery) -> Result<(), LifecycleError> {
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.listen, e))?;
    info!(addr = %config.listen, "hatcheryd listening");

    let app = crate::listener::router(hatchery.clone());
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!(pending = hatchery.tasks().len(), "draining background tasks");
    if !hatchery.tasks().drain(config.drain_timeout).await {
        warn!(timeout_ms = config.drain_timeout.as_millis() as u64, "drain timed out");
    }
    info!("hatcheryd shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
