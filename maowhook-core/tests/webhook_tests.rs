// File: maowhook-core/tests/webhook_tests.rs

mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use maowhook_core::Client;

use test_utils::*;

async fn client_with_recorder(event_type: &str) -> (Arc<Client>, mpsc::UnboundedReceiver<Value>) {
    let client = build_client(ScriptedHttpClient::new(), counting_token_source(1)).await;
    let (tx, rx) = mpsc::unbounded_channel();
    client.on(event_type, move |event| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(event);
        }
    });
    (client, rx)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Value>) -> Value {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("handler was not called")
        .expect("channel closed")
}

fn seconds_ago(seconds: i64) -> String {
    (Utc::now() - chrono::TimeDelta::seconds(seconds)).to_rfc3339_opts(SecondsFormat::Nanos, true)
}

async fn explode(_event: Value) {
    panic!("handler blew up");
}

async fn notify(client: &Client, message_id: &str, timestamp: &str, n: u64) -> StatusCode {
    let body = notification_body("stream.online", json!({ "n": n }));
    let headers = signed_headers(message_id, timestamp, "notification", &body);
    client.handle_webhook(&headers, &body).await.status
}

#[tokio::test]
async fn test_notification_reaches_handler() {
    let (client, mut rx) = client_with_recorder("stream.online").await;

    let status = notify(&client, "m-1", &now_timestamp(), 1).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(next_event(&mut rx).await, json!({ "n": 1 }));
}

#[tokio::test]
async fn test_bad_signature_is_forbidden() {
    let (client, mut rx) = client_with_recorder("stream.online").await;

    let body = notification_body("stream.online", json!({ "n": 1 }));
    let mut headers = signed_headers("m-1", &now_timestamp(), "notification", &body);
    headers.insert(
        "twitch-eventsub-message-signature",
        "sha256=0000".parse().unwrap(),
    );
    let response = client.handle_webhook(&headers, &body).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let tampered = notification_body("stream.online", json!({ "n": 2 }));
    let headers = signed_headers("m-2", &now_timestamp(), "notification", &body);
    let response = client.handle_webhook(&headers, &tampered).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_stale_message_is_accepted_but_not_forwarded() {
    let (client, mut rx) = client_with_recorder("stream.online").await;

    let status = notify(&client, "old", &seconds_ago(10 * 60 + 1), 1).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let status = notify(&client, "almost-old", &seconds_ago(10 * 60 - 1), 2).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(next_event(&mut rx).await, json!({ "n": 2 }));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_unparseable_timestamp_is_treated_as_fresh() {
    let (client, mut rx) = client_with_recorder("stream.online").await;

    notify(&client, "m-1", "yesterday-ish", 1).await;

    assert_eq!(next_event(&mut rx).await, json!({ "n": 1 }));
}

#[tokio::test]
async fn test_redelivered_message_is_dispatched_once() {
    let (client, mut rx) = client_with_recorder("stream.online").await;
    let ts = now_timestamp();

    assert_eq!(notify(&client, "dup", &ts, 1).await, StatusCode::NO_CONTENT);
    assert_eq!(notify(&client, "dup", &ts, 1).await, StatusCode::NO_CONTENT);
    notify(&client, "other", &ts, 2).await;

    let mut seen = vec![next_event(&mut rx).await, next_event(&mut rx).await];
    seen.sort_by_key(|v| v["n"].as_u64());
    assert_eq!(seen, vec![json!({ "n": 1 }), json!({ "n": 2 })]);
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_panicking_handler_does_not_break_dispatch() {
    let (client, mut rx) = client_with_recorder("stream.online").await;
    client.on("channel.follow", explode);

    let body = notification_body("channel.follow", json!({}));
    let headers = signed_headers("boom", &now_timestamp(), "notification", &body);
    assert_eq!(
        client.handle_webhook(&headers, &body).await.status,
        StatusCode::NO_CONTENT
    );

    notify(&client, "after", &now_timestamp(), 7).await;
    assert_eq!(next_event(&mut rx).await, json!({ "n": 7 }));
}

#[tokio::test]
async fn test_notification_without_handler_is_accepted() {
    let client = build_client(ScriptedHttpClient::new(), counting_token_source(1)).await;
    assert_eq!(
        notify(&client, "m-1", &now_timestamp(), 1).await,
        StatusCode::NO_CONTENT
    );
}

#[tokio::test]
async fn test_verification_echoes_challenge() {
    let client = build_client(ScriptedHttpClient::new(), counting_token_source(1)).await;

    let body = verification_body("sub-1", "pogchamp-kappa-360noscope-vohiyo");
    let headers = signed_headers("v-1", &now_timestamp(), "webhook_callback_verification", &body);
    let response = client.handle_webhook(&headers, &body).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body.as_deref(),
        Some("pogchamp-kappa-360noscope-vohiyo")
    );
}

#[tokio::test]
async fn test_revocation_invokes_callback() {
    let client = build_client(ScriptedHttpClient::new(), counting_token_source(1)).await;
    let revoked = Arc::new(Mutex::new(Vec::new()));
    {
        let revoked = revoked.clone();
        client.on_revocation(move |sub| {
            revoked.lock().push((sub.id.clone(), sub.status.to_string()));
        });
    }

    let mut subscription = subscription_json("sub-9", "channel.follow", "1337");
    subscription["status"] = json!("authorization_revoked");
    let body = json!({ "subscription": subscription }).to_string().into_bytes();
    let headers = signed_headers("r-1", &now_timestamp(), "revocation", &body);

    let response = client.handle_webhook(&headers, &body).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        *revoked.lock(),
        vec![("sub-9".to_string(), "authorization_revoked".to_string())]
    );
}

#[tokio::test]
async fn test_unknown_type_and_bad_json() {
    let client = build_client(ScriptedHttpClient::new(), counting_token_source(1)).await;

    let body = notification_body("stream.online", json!({}));
    let headers = signed_headers("u-1", &now_timestamp(), "something_new", &body);
    assert_eq!(
        client.handle_webhook(&headers, &body).await.status,
        StatusCode::NO_CONTENT
    );

    let body = b"{ not json".to_vec();
    let headers = signed_headers("u-2", &now_timestamp(), "notification", &body);
    assert_eq!(
        client.handle_webhook(&headers, &body).await.status,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_router_serves_webhook_route() {
    let client = build_client(ScriptedHttpClient::new(), counting_token_source(1)).await;
    let app = client.clone().router("/eventsub");

    let body = verification_body("sub-1", "hello");
    let headers = signed_headers("v-1", &now_timestamp(), "webhook_callback_verification", &body);
    let mut request = Request::post("/eventsub").body(Body::from(body)).unwrap();
    *request.headers_mut() = headers;

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/plain"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"hello");

    let response = app
        .oneshot(Request::get("/eventsub").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
