// File: maowhook-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use chrono::{SecondsFormat, Utc};
use http::StatusCode;
use mockall::mock;
use parking_lot::Mutex;
use serde_json::{json, Value};

use maowhook_common::traits::TokenSource;
use maowhook_core::crypto;
use maowhook_core::http::{HttpClient, HttpRequest, HttpResponse};
use maowhook_core::{Client, ClientConfig, Error};

pub const WEBHOOK_SECRET: &str = "s3cr3t-webhook-key";
pub const HELIX_URL: &str = "https://helix.test";

mock! {
    pub TokenSrc {}
    #[async_trait]
    impl TokenSource for TokenSrc {
        async fn generate(&self, client_id: &str, client_secret: &str) -> Result<String, Error>;
        async fn validate(&self, token: &str) -> Result<bool, Error>;
    }
}

/// Token source that hands out "token-1", "token-2", ... and expects exactly
/// `generations` calls to `generate`.
pub fn counting_token_source(generations: usize) -> MockTokenSrc {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut source = MockTokenSrc::new();
    source
        .expect_generate()
        .times(generations)
        .returning(move |_, _| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("token-{n}"))
        });
    source.expect_validate().returning(|_| Ok(true));
    source
}

/// Replays canned responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, status: StatusCode, body: impl Into<String>) {
        self.responses.lock().push_back(HttpResponse {
            status,
            body: body.into(),
        });
    }

    pub fn push_json(&self, status: StatusCode, body: Value) {
        self.push(status, body.to_string());
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let next = self.responses.lock().pop_front();
        let url = request.url.clone();
        self.requests.lock().push(request);
        next.ok_or_else(|| Error::Internal(format!("no scripted response for {url}")))
    }
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::new(
        "cid",
        "csecret",
        WEBHOOK_SECRET,
        "https://example.com/eventsub",
    );
    config.helix_url = HELIX_URL.to_string();
    config.verification_timeout = Duration::from_secs(10);
    config.token_validation_interval = Duration::from_secs(24 * 3600);
    config
}

pub async fn build_client(http: Arc<ScriptedHttpClient>, source: MockTokenSrc) -> Arc<Client> {
    let client = Client::builder(test_config())
        .http_client(http)
        .token_source(Arc::new(source))
        .build()
        .await
        .expect("client should build");
    Arc::new(client)
}

pub fn subscription_json(id: &str, sub_type: &str, broadcaster: &str) -> Value {
    json!({
        "id": id,
        "status": "enabled",
        "type": sub_type,
        "version": "1",
        "cost": 1,
        "condition": { "broadcaster_user_id": broadcaster },
        "transport": { "method": "webhook", "callback": "https://example.com/eventsub" },
        "created_at": "2024-05-01T12:00:00.634234626Z"
    })
}

pub fn page(subscriptions: Vec<Value>, cursor: Option<&str>) -> Value {
    let pagination = match cursor {
        Some(c) => json!({ "cursor": c }),
        None => json!({}),
    };
    json!({
        "data": subscriptions,
        "total": 0,
        "total_cost": 0,
        "max_total_cost": 10000,
        "pagination": pagination,
    })
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Headers Twitch would send for `body`, signed with [`WEBHOOK_SECRET`].
pub fn signed_headers(message_id: &str, timestamp: &str, message_type: &str, body: &[u8]) -> HeaderMap {
    let signature = crypto::sign(WEBHOOK_SECRET, message_id, timestamp, body);
    let mut headers = HeaderMap::new();
    let mut put = |name: &'static str, value: &str| {
        headers.insert(name, HeaderValue::from_str(value).expect("valid header value"));
    };
    put("twitch-eventsub-message-id", message_id);
    put("twitch-eventsub-message-timestamp", timestamp);
    put("twitch-eventsub-message-signature", &signature);
    put("twitch-eventsub-message-type", message_type);
    put("content-type", "application/json");
    headers
}

pub fn notification_body(sub_type: &str, event: Value) -> Vec<u8> {
    json!({
        "subscription": subscription_json("f1c2a387-161a-49f9-a165-0f21d7a4e1c4", sub_type, "1337"),
        "event": event,
    })
    .to_string()
    .into_bytes()
}

pub fn verification_body(subscription_id: &str, challenge: &str) -> Vec<u8> {
    let mut subscription = subscription_json(subscription_id, "stream.online", "1337");
    subscription["status"] = json!("webhook_callback_verification_pending");
    json!({
        "challenge": challenge,
        "subscription": subscription,
    })
    .to_string()
    .into_bytes()
}
