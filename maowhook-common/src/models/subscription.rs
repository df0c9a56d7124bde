// File: maowhook-common/src/models/subscription.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Subscription condition. Fill out the fields applicable to the subscription type;
/// unset fields are omitted on the wire.
///
/// Equality is structural across every field, unset ones included. That is safe as long
/// as conditions of the same subscription type are compared, because a type only ever
/// populates its own subset. Helix may echo unused fields as `""`; those deserialize
/// to `None` so they compare equal to fields that were never set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub broadcaster_user_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub moderator_user_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub from_broadcaster_user_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub to_broadcaster_user_id: Option<String>,

    /// String for channel points rewards, integer for some extension types,
    /// so it's kept as raw JSON.
    #[serde(
        default,
        deserialize_with = "empty_value_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub reward_id: Option<serde_json::Value>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub extension_client_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub conduit_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub campaign_id: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn empty_value_as_none<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(non_empty_value))
}

fn non_empty(id: String) -> Option<String> {
    Some(id).filter(|s| !s.is_empty())
}

fn non_empty_value(id: serde_json::Value) -> Option<serde_json::Value> {
    Some(id).filter(|v| !v.is_null() && v.as_str() != Some(""))
}

impl Condition {
    /// The most common condition: a single broadcaster.
    pub fn broadcaster(broadcaster_user_id: impl Into<String>) -> Self {
        Self {
            broadcaster_user_id: non_empty(broadcaster_user_id.into()),
            ..Default::default()
        }
    }

    pub fn with_broadcaster_user_id(mut self, id: impl Into<String>) -> Self {
        self.broadcaster_user_id = non_empty(id.into());
        self
    }

    pub fn with_moderator_user_id(mut self, id: impl Into<String>) -> Self {
        self.moderator_user_id = non_empty(id.into());
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = non_empty(id.into());
        self
    }

    pub fn with_from_broadcaster_user_id(mut self, id: impl Into<String>) -> Self {
        self.from_broadcaster_user_id = non_empty(id.into());
        self
    }

    pub fn with_to_broadcaster_user_id(mut self, id: impl Into<String>) -> Self {
        self.to_broadcaster_user_id = non_empty(id.into());
        self
    }

    pub fn with_reward_id(mut self, id: impl Into<serde_json::Value>) -> Self {
        self.reward_id = non_empty_value(id.into());
        self
    }

    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = non_empty(id.into());
        self
    }

    pub fn with_extension_client_id(mut self, id: impl Into<String>) -> Self {
        self.extension_client_id = non_empty(id.into());
        self
    }

    pub fn with_conduit_id(mut self, id: impl Into<String>) -> Self {
        self.conduit_id = non_empty(id.into());
        self
    }

    pub fn with_organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = non_empty(id.into());
        self
    }

    pub fn with_category_id(mut self, id: impl Into<String>) -> Self {
        self.category_id = non_empty(id.into());
        self
    }

    pub fn with_campaign_id(mut self, id: impl Into<String>) -> Self {
        self.campaign_id = non_empty(id.into());
        self
    }
}

/// Subscription status as reported by Helix.
/// Unknown values are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    Enabled,
    WebhookCallbackVerificationPending,
    WebhookCallbackVerificationFailed,
    NotificationFailuresExceeded,
    AuthorizationRevoked,
    ModeratorRemoved,
    UserRemoved,
    VersionRemoved,
    BetaMaintenance,
    Other(String),
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Enabled => "enabled",
            SubscriptionStatus::WebhookCallbackVerificationPending => "webhook_callback_verification_pending",
            SubscriptionStatus::WebhookCallbackVerificationFailed => "webhook_callback_verification_failed",
            SubscriptionStatus::NotificationFailuresExceeded => "notification_failures_exceeded",
            SubscriptionStatus::AuthorizationRevoked => "authorization_revoked",
            SubscriptionStatus::ModeratorRemoved => "moderator_removed",
            SubscriptionStatus::UserRemoved => "user_removed",
            SubscriptionStatus::VersionRemoved => "version_removed",
            SubscriptionStatus::BetaMaintenance => "beta_maintenance",
            SubscriptionStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for SubscriptionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "enabled" => SubscriptionStatus::Enabled,
            "webhook_callback_verification_pending" => SubscriptionStatus::WebhookCallbackVerificationPending,
            "webhook_callback_verification_failed" => SubscriptionStatus::WebhookCallbackVerificationFailed,
            "notification_failures_exceeded" => SubscriptionStatus::NotificationFailuresExceeded,
            "authorization_revoked" => SubscriptionStatus::AuthorizationRevoked,
            "moderator_removed" => SubscriptionStatus::ModeratorRemoved,
            "user_removed" => SubscriptionStatus::UserRemoved,
            "version_removed" => SubscriptionStatus::VersionRemoved,
            "beta_maintenance" => SubscriptionStatus::BetaMaintenance,
            _ => SubscriptionStatus::Other(s),
        }
    }
}

impl From<&str> for SubscriptionStatus {
    fn from(s: &str) -> Self {
        SubscriptionStatus::from(s.to_string())
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery transport as echoed back by Helix. The secret is never echoed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionTransport {
    pub method: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub callback: Option<String>,
}

/// An EventSub subscription record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub status: SubscriptionStatus,
    #[serde(rename = "type")]
    pub sub_type: String,
    pub version: String,
    #[serde(default)]
    pub cost: i64,
    /// Unused fields are left unset. Check `sub_type` to know which ones matter.
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub transport: SubscriptionTransport,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// Narrows a subscription listing. Helix accepts at most one of these per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubscriptionFilter {
    #[default]
    All,
    Type(String),
    Status(SubscriptionStatus),
}

impl SubscriptionFilter {
    /// The `(key, value)` query parameter for this filter, if any.
    pub fn query_param(&self) -> Option<(&'static str, &str)> {
        match self {
            SubscriptionFilter::All => None,
            SubscriptionFilter::Type(t) => Some(("type", t.as_str())),
            SubscriptionFilter::Status(s) => Some(("status", s.as_str())),
        }
    }
}
