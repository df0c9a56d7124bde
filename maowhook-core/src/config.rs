// File: maowhook-core/src/config.rs

use std::time::Duration;

use crate::auth::token_source::DEFAULT_ID_URL;
use crate::tasks::credential_refresh::DEFAULT_VALIDATION_INTERVAL;
use crate::Error;

pub const DEFAULT_HELIX_URL: &str = "https://api.twitch.tv/helix";
pub const DEFAULT_VERIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a [`crate::Client`] needs to talk to Twitch.
#[derive(Clone)]
pub struct ClientConfig {
    /// Client ID of your Twitch application.
    pub client_id: String,
    /// Client secret of your Twitch application. This is NOT the webhook secret.
    pub client_secret: String,
    /// Shared secret Twitch uses to sign webhook requests (10-100 characters).
    pub webhook_secret: String,
    /// Full public callback URL, e.g. `https://mydomain.com/eventsub`.
    pub webhook_url: String,
    pub helix_url: String,
    pub id_url: String,
    /// How long `create_subscription` waits for the verification request.
    pub verification_timeout: Duration,
    pub token_validation_interval: Duration,
}

impl ClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        webhook_secret: impl Into<String>,
        webhook_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            webhook_secret: webhook_secret.into(),
            webhook_url: webhook_url.into(),
            helix_url: DEFAULT_HELIX_URL.to_string(),
            id_url: DEFAULT_ID_URL.to_string(),
            verification_timeout: DEFAULT_VERIFICATION_TIMEOUT,
            token_validation_interval: DEFAULT_VALIDATION_INTERVAL,
        }
    }

    /// Reads `TWITCH_CLIENT_ID`, `TWITCH_CLIENT_SECRET`, `TWITCH_WEBHOOK_SECRET`,
    /// `TWITCH_WEBHOOK_URL` and the optional `TWITCH_HELIX_URL` / `TWITCH_ID_URL`.
    /// A `.env` file in the working directory is honoured.
    pub fn from_env() -> Result<Self, Error> {
        let _ = dotenv::dotenv();

        let mut config = Self::new(
            required_env("TWITCH_CLIENT_ID")?,
            required_env("TWITCH_CLIENT_SECRET")?,
            required_env("TWITCH_WEBHOOK_SECRET")?,
            required_env("TWITCH_WEBHOOK_URL")?,
        );
        if let Ok(url) = std::env::var("TWITCH_HELIX_URL") {
            config.helix_url = url;
        }
        if let Ok(url) = std::env::var("TWITCH_ID_URL") {
            config.id_url = url;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config("client_id is empty".into()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(Error::Config("client_secret is empty".into()));
        }
        let secret_len = self.webhook_secret.chars().count();
        if !(10..=100).contains(&secret_len) {
            return Err(Error::Config(format!(
                "webhook_secret must be 10-100 characters, got {}",
                secret_len
            )));
        }
        let url = reqwest::Url::parse(&self.webhook_url)
            .map_err(|e| Error::Config(format!("webhook_url is not a valid URL: {e}")))?;
        if url.scheme() != "https" {
            return Err(Error::Config(format!(
                "webhook_url must use https, got '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }
}

fn required_env(key: &str) -> Result<String, Error> {
    std::env::var(key).map_err(|_| Error::Config(format!("{} is not set", key)))
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("webhook_secret", &"[redacted]")
            .field("webhook_url", &self.webhook_url)
            .field("helix_url", &self.helix_url)
            .field("id_url", &self.id_url)
            .field("verification_timeout", &self.verification_timeout)
            .field("token_validation_interval", &self.token_validation_interval)
            .finish()
    }
}
