// ================================================================
// File: maowhook-common/src/error.rs
// ================================================================

use thiserror::Error;

use crate::models::subscription::{Condition, Subscription};

#[derive(Debug, Error)]
pub enum Error {
    /// Helix rejected the app access token, and regenerating it did not help.
    #[error("Unauthorized: Helix rejected the app access token")]
    Unauthorized,

    /// 409 from Helix: a subscription with this type and condition already exists.
    #[error("Duplicate subscription: type={subscription_type} condition={condition:?}")]
    DuplicateSubscription {
        subscription_type: String,
        condition: Condition,
    },

    #[error("Subscription not found")]
    SubscriptionNotFound,

    /// Helix accepted the subscription but the verification callback never
    /// arrived in time. The subscription may still exist remotely in a pending state.
    #[error("Timed out waiting for verification of subscription {}", .0.id)]
    VerificationTimeout(Box<Subscription>),

    #[error("Unhandled HTTP status {status}: {body}")]
    UnhandledStatus { status: u16, body: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The subscription left behind by a verification timeout, if that's what this is.
    pub fn orphaned_subscription(&self) -> Option<&Subscription> {
        match self {
            Error::VerificationTimeout(sub) => Some(sub),
            _ => None,
        }
    }

    /// Serialization, transport, and other failures that are not a Helix verdict.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Error::Internal(_) | Error::Http(_) | Error::Json(_) | Error::Io(_)
        )
    }
}
