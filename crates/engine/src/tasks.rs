// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detached work that outlives the request that started it.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Registry of detached tasks, drained at shutdown.
///
/// Tasks never inherit a request's cancellation; the only way to stop one
/// early is [`drain`](Self::drain) running out of time.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, task: &'static str, user: &str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.shutdown.clone();
        let user = user.to_string();
        tracing::debug!(task, %user, "spawning background task");
        self.tracker.spawn(async move {
            tokio::select! {
                () = fut => {}
                () = token.cancelled() => {
                    tracing::warn!(task, %user, "background task cancelled at shutdown");
                }
            }
        });
    }

    /// Number of tasks still running
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Wait for running tasks; whatever is left after `timeout` is cancelled.
    ///
    /// Returns `true` when every task finished on its own.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let finished = tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok();
        if !finished {
            tracing::warn!(remaining = self.tracker.len(), "cancelling background tasks");
            self.shutdown.cancel();
            self.tracker.wait().await;
        }
        self.tracker.reopen();
        finished
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
