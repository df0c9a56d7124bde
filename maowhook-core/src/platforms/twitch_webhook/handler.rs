// File: maowhook-core/src/platforms/twitch_webhook/handler.rs

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{DateTime, TimeDelta, Utc};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, trace, warn};

use maowhook_common::models::webhook::{
    HEADER_MESSAGE_ID, HEADER_MESSAGE_SIGNATURE, HEADER_MESSAGE_TIMESTAMP, HEADER_MESSAGE_TYPE,
};
use maowhook_common::models::{MessageType, WebhookPayload};

use crate::crypto;

use super::client::{Client, EventHandler};

/// Messages older than this are dropped as possible replays.
pub const MAX_MESSAGE_AGE: Duration = Duration::from_secs(10 * 60);

/// What the webhook endpoint answers Twitch with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: StatusCode,
    /// Only set for verification requests: the challenge, echoed as text/plain.
    pub body: Option<String>,
}

impl WebhookResponse {
    fn status(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    fn challenge(challenge: String) -> Self {
        Self {
            status: StatusCode::OK,
            body: Some(challenge),
        }
    }
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (
                self.status,
                [(header::CONTENT_TYPE, "text/plain")],
                body,
            )
                .into_response(),
            None => self.status.into_response(),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// `true` if `timestamp` is more than [`MAX_MESSAGE_AGE`] before `now`.
/// A timestamp that cannot be parsed counts as fresh.
pub(crate) fn is_message_too_old(timestamp: &str, now: DateTime<Utc>) -> bool {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(sent) => {
            let max_age = TimeDelta::seconds(MAX_MESSAGE_AGE.as_secs() as i64);
            now.signed_duration_since(sent.with_timezone(&Utc)) > max_age
        }
        Err(_) => {
            trace!("[EventSub] unparseable message timestamp '{}'", timestamp);
            false
        }
    }
}

impl Client {
    /// Processes one inbound webhook request.
    ///
    /// The signature is checked first, then message age, then the body is
    /// parsed and dispatched by message type.
    pub async fn handle_webhook(&self, headers: &HeaderMap, body: &[u8]) -> WebhookResponse {
        let message_id = header_str(headers, HEADER_MESSAGE_ID);
        let timestamp = header_str(headers, HEADER_MESSAGE_TIMESTAMP);
        let signature = header_str(headers, HEADER_MESSAGE_SIGNATURE);

        if !crypto::verify(
            &self.config.webhook_secret,
            message_id,
            timestamp,
            body,
            signature,
        ) {
            warn!("[EventSub] invalid signature on message '{}'", message_id);
            return WebhookResponse::status(StatusCode::FORBIDDEN);
        }

        if is_message_too_old(timestamp, Utc::now()) {
            debug!("[EventSub] message {} is too old, ignoring", message_id);
            return WebhookResponse::status(StatusCode::NO_CONTENT);
        }

        let payload: WebhookPayload = match serde_json::from_slice(body) {
            Ok(p) => p,
            Err(e) => {
                error!("[EventSub] could not parse webhook body: {}", e);
                return WebhookResponse::status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        match MessageType::parse(header_str(headers, HEADER_MESSAGE_TYPE)) {
            MessageType::Notification => self.dispatch_notification(message_id, payload).await,
            MessageType::Verification => {
                let id = &payload.subscription.id;
                info!("[EventSub] verification request for {}", id);
                self.verifications.confirm(id);
                WebhookResponse::challenge(payload.challenge.unwrap_or_default())
            }
            MessageType::Revocation => {
                let sub = &payload.subscription;
                warn!(
                    "[EventSub] subscription {} ({}) revoked: {}",
                    sub.id, sub.sub_type, sub.status
                );
                let callback = self.on_revocation.read().clone();
                if let Some(callback) = callback {
                    callback(sub);
                }
                WebhookResponse::status(StatusCode::NO_CONTENT)
            }
            MessageType::Unknown(other) => {
                warn!("[EventSub] unknown message type '{}', ignoring", other);
                WebhookResponse::status(StatusCode::NO_CONTENT)
            }
        }
    }

    async fn dispatch_notification(
        &self,
        message_id: &str,
        payload: WebhookPayload,
    ) -> WebhookResponse {
        let sub_type = payload.subscription.sub_type;

        if !self.handled_events.mark_if_new(message_id).await {
            debug!("[EventSub] duplicate message {}, ignoring", message_id);
            return WebhookResponse::status(StatusCode::NO_CONTENT);
        }

        let handler = self.handlers.get(&sub_type).map(|h| h.value().clone());
        match handler {
            Some(handler) => {
                trace!("[EventSub] dispatching {} ({})", sub_type, message_id);
                spawn_handler(sub_type, handler, payload.event.unwrap_or_default());
            }
            None => debug!("[EventSub] no handler for {}", sub_type),
        }
        WebhookResponse::status(StatusCode::NO_CONTENT)
    }

    /// Router with a single POST route at `path` serving [`webhook_handler`].
    pub fn router(self: Arc<Self>, path: &str) -> Router {
        Router::new()
            .route(path, post(webhook_handler))
            .with_state(self)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }
}

/// Runs the handler on its own task; a panic is logged rather than propagated.
fn spawn_handler(sub_type: String, handler: EventHandler, event: serde_json::Value) {
    let task = tokio::spawn(handler(event));
    tokio::spawn(async move {
        if let Err(e) = task.await {
            if e.is_panic() {
                error!("[EventSub] handler for {} panicked", sub_type);
            }
        }
    });
}

/// Axum handler for the webhook route. Expects `State<Arc<Client>>`.
pub async fn webhook_handler(
    State(client): State<Arc<Client>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> WebhookResponse {
    match body {
        Ok(body) => client.handle_webhook(&headers, &body).await,
        Err(e) => {
            error!("[EventSub] could not read webhook body: {}", e);
            WebhookResponse::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
