// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hatcheryd: workspace lifecycle daemon

use std::process::ExitCode;

use hatch_daemon::{logging, run, startup, Config, LifecycleError};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // Before Config::load, so its failures are logged too
    let log_dir = hatch_daemon::env::log_dir();
    let _guard = logging::init(log_dir.as_deref());

    match serve().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "hatcheryd failed");
            ExitCode::FAILURE
        }
    }
}

async fn serve() -> Result<(), LifecycleError> {
    let config = Config::load()?;
    let hatchery = startup(&config).await?;
    run(&config, hatchery).await
}
