// File: maowhook-common/src/models/mod.rs

pub mod subscription;
pub mod webhook;

pub use subscription::{Condition, Subscription, SubscriptionFilter, SubscriptionStatus, SubscriptionTransport};
pub use webhook::{MessageType, WebhookPayload};
