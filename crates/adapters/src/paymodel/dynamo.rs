// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{PayModelError, PayModelStore};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use hatch_core::{AllPayModels, PayModel};
use std::collections::HashMap;

/// Pay models in a DynamoDB table keyed by `user_id` / `bmh_workspace_id`.
#[derive(Clone)]
pub struct DynamoPayModelStore {
    client: Client,
    table: String,
}

impl DynamoPayModelStore {
    pub fn new(config: &SdkConfig, table: impl Into<String>) -> Self {
        Self { client: Client::new(config), table: table.into() }
    }

    /// Every pay model of `user`, across all result pages.
    async fn query_user(&self, user: &str) -> Result<Vec<PayModel>, PayModelError> {
        let mut items = self
            .client
            .query()
            .table_name(&self.table)
            .key_condition_expression("user_id = :u")
            .expression_attribute_values(":u", AttributeValue::S(user.to_string()))
            .into_paginator()
            .items()
            .send();
        let mut models = Vec::new();
        while let Some(item) = items.next().await {
            let item = item.map_err(|e| PayModelError::Store(e.to_string()))?;
            models.push(item_to_pay_model(&item)?);
        }
        Ok(models)
    }

    async fn write_current(&self, model: &PayModel, current: bool) -> Result<(), PayModelError> {
        self.client
            .update_item()
            .table_name(&self.table)
            .key("user_id", AttributeValue::S(model.user_id.clone()))
            .key("bmh_workspace_id", AttributeValue::S(model.id.clone()))
            .update_expression("SET current_pay_model = :c")
            .expression_attribute_values(":c", AttributeValue::Bool(current))
            .send()
            .await
            .map_err(|e| PayModelError::Store(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl PayModelStore for DynamoPayModelStore {
    async fn pay_models(&self, user: &str) -> Result<Option<AllPayModels>, PayModelError> {
        let models = self.query_user(user).await?;
        if models.is_empty() {
            return Ok(None);
        }
        Ok(Some(AllPayModels::from_models(models)))
    }

    async fn set_current(&self, user: &str, id: &str) -> Result<PayModel, PayModelError> {
        let models = self.query_user(user).await?;
        let mut chosen = models
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| PayModelError::NotFound { user: user.to_string(), id: id.to_string() })?;

        for model in models.iter().filter(|m| m.current && m.id != id) {
            self.write_current(model, false).await?;
        }
        self.write_current(&chosen, true).await?;
        chosen.current = true;
        tracing::info!(%user, pay_model = %id, "current pay model set");
        Ok(chosen)
    }

    async fn reset_current(&self, user: &str) -> Result<(), PayModelError> {
        for model in self.query_user(user).await?.iter().filter(|m| m.current) {
            self.write_current(model, false).await?;
        }
        tracing::info!(%user, "current pay model reset");
        Ok(())
    }
}

fn item_to_pay_model(item: &HashMap<String, AttributeValue>) -> Result<PayModel, PayModelError> {
    let get_s = |k: &str| -> Result<String, PayModelError> {
        item.get(k)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| PayModelError::Malformed(format!("missing {k}")))
    };
    let get_opt_s =
        |k: &str| -> String { item.get(k).and_then(|v| v.as_s().ok()).cloned().unwrap_or_default() };
    let get_bool = |k: &str| -> bool { item.get(k).and_then(|v| v.as_bool().ok()).copied().unwrap_or(false) };
    let get_n = |k: &str| -> f64 {
        item.get(k).and_then(|v| v.as_n().ok()).and_then(|n| n.parse().ok()).unwrap_or(0.0)
    };

    Ok(PayModel {
        id: get_s("bmh_workspace_id")?,
        user_id: get_s("user_id")?,
        name: get_opt_s("workspace_type"),
        account_id: get_opt_s("account_id"),
        status: get_opt_s("request_status"),
        local: get_bool("local"),
        region: get_opt_s("region"),
        ecs: get_bool("ecs"),
        subnet: get_n("subnet") as i64,
        hard_limit: get_n("hard-limit"),
        soft_limit: get_n("soft-limit"),
        total_usage: get_n("total-usage"),
        current: get_bool("current_pay_model"),
    })
}

#[cfg(test)]
#[path = "dynamo_tests.rs"]
mod tests;
