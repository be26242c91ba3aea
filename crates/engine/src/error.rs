// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::pod::BuildError;
use hatch_adapters::{EcsError, KubeError, MapperError, PayModelError};
use thiserror::Error;

/// Coarse error classes callers map onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; retrying the same request cannot succeed
    Validation,
    /// The object an operation needs does not exist
    NotFound,
    /// Refused because of the workspace or pay-model state
    Conflict,
    /// A backend call failed
    Backend,
}

#[derive(Debug, Error)]
pub enum HatcheryError {
    #[error("Container {0} not found")]
    UnknownApp(String),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("{0}")]
    NotFound(String),
    #[error("Paymodel is not active. Launch forbidden")]
    PayModelInactive,
    #[error("Workspace is already running. Launch forbidden")]
    AlreadyRunning,
    #[error("Can not update paymodel when workspace is running")]
    UpdateWhileRunning,
    #[error("Can not reset paymodels when workspace is running")]
    ResetWhileRunning,
    #[error("No cluster configured for account {0}")]
    UnknownCluster(String),
    #[error(transparent)]
    Kube(#[from] KubeError),
    #[error(transparent)]
    Ecs(#[from] EcsError),
    #[error(transparent)]
    PayModel(#[from] PayModelError),
    #[error(transparent)]
    Mapper(#[from] MapperError),
}

impl HatcheryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HatcheryError::UnknownApp(_)
            | HatcheryError::Build(_)
            | HatcheryError::Ecs(EcsError::Env(_)) => ErrorKind::Validation,
            HatcheryError::NotFound(_)
            | HatcheryError::Ecs(EcsError::NotFound(_))
            | HatcheryError::PayModel(PayModelError::NotFound { .. }) => ErrorKind::NotFound,
            HatcheryError::PayModelInactive
            | HatcheryError::AlreadyRunning
            | HatcheryError::UpdateWhileRunning
            | HatcheryError::ResetWhileRunning => ErrorKind::Conflict,
            _ => ErrorKind::Backend,
        }
    }
}
