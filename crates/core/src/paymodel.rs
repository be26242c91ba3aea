// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pay models: which backend and billing account a user's workspace runs under.
//!
//! Records are owned by an external store; the controller only reads them and
//! flips the `current` flag through the store's set/reset calls.

use serde::{Deserialize, Serialize};

/// Backend a pay model routes workspaces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    LocalK8s,
    ExternalK8s,
    Ecs,
}

crate::simple_display! {
    BackendKind {
        LocalK8s => "local-k8s",
        ExternalK8s => "external-k8s",
        Ecs => "ecs",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayModel {
    #[serde(rename = "bmh_workspace_id")]
    pub id: String,
    #[serde(rename = "workspace_type")]
    pub name: String,
    pub user_id: String,
    #[serde(rename = "account_id")]
    pub account_id: String,
    /// Activation status; only consulted for ECS pay models
    #[serde(rename = "request_status")]
    pub status: String,
    pub local: bool,
    pub region: String,
    pub ecs: bool,
    pub subnet: i64,
    #[serde(rename = "hard-limit")]
    pub hard_limit: f64,
    #[serde(rename = "soft-limit")]
    pub soft_limit: f64,
    #[serde(rename = "total-usage")]
    pub total_usage: f64,
    #[serde(rename = "current_pay_model")]
    pub current: bool,
}

impl PayModel {
    pub fn backend(&self) -> BackendKind {
        if self.ecs {
            BackendKind::Ecs
        } else if self.local {
            BackendKind::LocalK8s
        } else {
            BackendKind::ExternalK8s
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Every pay model of a user, with the current one split out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllPayModels {
    pub current_pay_model: Option<PayModel>,
    pub all_pay_models: Vec<PayModel>,
}

impl AllPayModels {
    pub fn from_models(models: Vec<PayModel>) -> Self {
        let current_pay_model = models.iter().find(|m| m.current).cloned();
        Self { current_pay_model, all_pay_models: models }
    }
}

crate::builder! {
    pub struct PayModelBuilder => PayModel {
        into {
            id: String = "workspace-1",
            name: String = "Direct Pay",
            user_id: String = "alice",
            account_id: String = "123456789012",
            status: String = "active",
            region: String = "us-east-1",
        }
        set {
            local: bool = false,
            ecs: bool = false,
            subnet: i64 = 0,
            hard_limit: f64 = 0.0,
            soft_limit: f64 = 0.0,
            total_usage: f64 = 0.0,
            current: bool = true,
        }
    }
}

#[cfg(test)]
#[path = "paymodel_tests.rs"]
mod tests;
