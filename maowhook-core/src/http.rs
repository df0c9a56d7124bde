//! HTTP client abstraction for the Helix and OAuth calls.
//!
//! Every outbound request goes through [`HttpClient`], so the subscription
//! registry and the token source can be exercised against a scripted client in
//! tests without touching the network. Non-2xx statuses are *not* errors at
//! this layer: callers need the raw status to tell 202/204/401/404/409 apart.
//!
//! The default implementation wraps reqwest.

use async_trait::async_trait;
use http::{Method, StatusCode};
use tracing::trace;

use crate::Error;

/// An outbound request, fully described up front so it can be replayed after a
/// token refresh.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replaces any existing header with the same (case-insensitive) name.
    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self.headers.push((key.to_string(), value.into()));
    }
}

/// Status and fully-read body of a response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

/// A generic trait for sending HTTP requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

#[derive(Clone, Default)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        trace!("{} {} => HTTP {}", request.method, request.url, status);

        Ok(HttpResponse { status, body })
    }
}
