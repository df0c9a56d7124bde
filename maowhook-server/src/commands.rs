// File: maowhook-server/src/commands.rs

use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::{Map, Value};
use tracing::info;

use maowhook_common::models::{Condition, SubscriptionFilter, SubscriptionStatus};
use maowhook_core::Client;

/// A subscription requested on the command line as `type:version:key=value,...`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionArg {
    pub sub_type: String,
    pub version: String,
    pub condition: Condition,
}

impl FromStr for SubscriptionArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(sub_type), Some(version), Some(condition)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected type:version:key=value,..., got '{}'", s));
        };
        if sub_type.is_empty() || version.is_empty() {
            return Err(format!("type and version must not be empty in '{}'", s));
        }
        Ok(Self {
            sub_type: sub_type.to_string(),
            version: version.to_string(),
            condition: parse_condition(condition)?,
        })
    }
}

/// Parses `key=value,key=value` into a [`Condition`]. Unknown keys are rejected.
pub fn parse_condition(s: &str) -> Result<Condition, String> {
    let mut fields = Map::new();
    for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("condition entry '{}' is not key=value", pair))?;
        fields.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
    }
    if fields.is_empty() {
        return Err("condition must have at least one key=value".into());
    }

    let expected = fields.len();
    let condition: Condition =
        serde_json::from_value(Value::Object(fields)).map_err(|e| e.to_string())?;
    let recognised = match serde_json::to_value(&condition) {
        Ok(Value::Object(map)) => map.len(),
        _ => 0,
    };
    if recognised != expected {
        return Err(format!("unknown condition key in '{}'", s));
    }
    Ok(condition)
}

pub async fn list(
    client: &Client,
    sub_type: Option<String>,
    status: Option<String>,
) -> anyhow::Result<()> {
    let filter = match (sub_type, status) {
        (Some(t), _) => SubscriptionFilter::Type(t),
        (None, Some(s)) => SubscriptionFilter::Status(SubscriptionStatus::from(s.as_str())),
        (None, None) => SubscriptionFilter::All,
    };

    let subscriptions = client
        .list_subscriptions(filter)
        .await
        .context("listing subscriptions")?;
    for sub in &subscriptions {
        println!("{}", serde_json::to_string(sub)?);
    }
    info!("{} subscription(s)", subscriptions.len());
    Ok(())
}

pub async fn remove(client: &Client, id: &str) -> anyhow::Result<()> {
    client
        .remove_subscription(id)
        .await
        .with_context(|| format!("removing subscription {}", id))?;
    println!("removed {}", id);
    Ok(())
}

pub async fn remove_type(client: &Client, sub_type: &str, condition: &str) -> anyhow::Result<()> {
    let condition = parse_condition(condition).map_err(|e| anyhow!(e))?;
    let removed = client
        .remove_subscriptions_by_type(sub_type, &condition)
        .await
        .with_context(|| format!("removing {} subscriptions", sub_type))?;
    println!("removed {} subscription(s) of type {}", removed, sub_type);
    Ok(())
}
