// File: maowhook-common/src/models/webhook.rs

use serde::{Deserialize, Serialize};

use super::subscription::Subscription;

/// Header names Twitch sends with every webhook request.
pub const HEADER_MESSAGE_ID: &str = "Twitch-Eventsub-Message-Id";
pub const HEADER_MESSAGE_TIMESTAMP: &str = "Twitch-Eventsub-Message-Timestamp";
pub const HEADER_MESSAGE_SIGNATURE: &str = "Twitch-Eventsub-Message-Signature";
pub const HEADER_MESSAGE_TYPE: &str = "Twitch-Eventsub-Message-Type";

/// Body of an inbound webhook request.
///
/// Notifications carry `event`, verification requests carry `challenge`,
/// revocations carry only `subscription`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub challenge: Option<String>,
    pub subscription: Subscription,
    #[serde(default)]
    pub event: Option<serde_json::Value>,
}

/// Value of the `Twitch-Eventsub-Message-Type` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    Notification,
    Verification,
    Revocation,
    Unknown(String),
}

impl MessageType {
    pub fn parse(header: &str) -> Self {
        match header {
            "notification" => MessageType::Notification,
            "webhook_callback_verification" => MessageType::Verification,
            "revocation" => MessageType::Revocation,
            other => MessageType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Notification => "notification",
            MessageType::Verification => "webhook_callback_verification",
            MessageType::Revocation => "revocation",
            MessageType::Unknown(s) => s.as_str(),
        }
    }
}
