// File: maowhook-core/src/auth/token_source.rs

use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use maowhook_common::traits::TokenSource;

use crate::http::{HttpClient, HttpRequest};
use crate::Error;

pub const DEFAULT_ID_URL: &str = "https://id.twitch.tv";

/// Matches Twitch's JSON from the token endpoint for the client-credentials grant.
#[derive(Deserialize)]
struct AppTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// App access tokens via the OAuth client-credentials grant, validated against `/oauth2/validate`.
pub struct TwitchTokenSource {
    http: Arc<dyn HttpClient>,
    id_url: String,
}

impl TwitchTokenSource {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self::with_id_url(http, DEFAULT_ID_URL)
    }

    pub fn with_id_url(http: Arc<dyn HttpClient>, id_url: &str) -> Self {
        Self {
            http,
            id_url: id_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TokenSource for TwitchTokenSource {
    async fn generate(&self, client_id: &str, client_secret: &str) -> Result<String, Error> {
        let form = format!(
            "client_id={}&client_secret={}&grant_type=client_credentials",
            urlencoding::encode(client_id),
            urlencoding::encode(client_secret),
        );
        let request = HttpRequest::new(Method::POST, format!("{}/oauth2/token", self.id_url))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(form);

        let resp = self.http.send(request).await?;
        if !resp.status.is_success() {
            warn!("[TwitchAuth] token endpoint returned HTTP {}", resp.status);
            return Err(Error::Auth(format!(
                "Twitch token endpoint error: HTTP {} => {}",
                resp.status, resp.body
            )));
        }

        let parsed: AppTokenResponse = serde_json::from_str(&resp.body)
            .map_err(|e| Error::Auth(format!("Parse error on token JSON: {e}")))?;
        debug!(
            "[TwitchAuth] app access token issued, expires_in={:?}",
            parsed.expires_in
        );
        Ok(parsed.access_token)
    }

    async fn validate(&self, token: &str) -> Result<bool, Error> {
        let request = HttpRequest::new(Method::GET, format!("{}/oauth2/validate", self.id_url))
            .header("Authorization", format!("OAuth {}", token));

        let resp = self.http.send(request).await?;
        match resp.status {
            StatusCode::OK => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            other => Err(Error::UnhandledStatus {
                status: other.as_u16(),
                body: resp.body,
            }),
        }
    }
}
