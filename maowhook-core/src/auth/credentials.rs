// File: maowhook-core/src/auth/credentials.rs

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use twitch_oauth2::{AccessToken, ClientId, ClientSecret};

use maowhook_common::traits::TokenSource;

use crate::Error;

/// Owns the single current app access token.
///
/// Reads always see the latest write. Regenerations are serialised, and a
/// failed regeneration leaves the previous token in place.
pub struct CredentialManager {
    source: Arc<dyn TokenSource>,
    client_id: ClientId,
    client_secret: ClientSecret,
    token: RwLock<AccessToken>,
    refresh_lock: Mutex<()>,
}

impl CredentialManager {
    /// Generates the first token. Failing here means no client can be built.
    pub async fn init(
        source: Arc<dyn TokenSource>,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Self, Error> {
        info!("[TwitchAuth] generating app access token");
        let token = source.generate(client_id, client_secret).await?;
        info!("[TwitchAuth] app access token generated");

        Ok(Self {
            source,
            client_id: ClientId::new(client_id.to_string()),
            client_secret: ClientSecret::new(client_secret.to_string()),
            token: RwLock::new(AccessToken::new(token)),
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn client_id(&self) -> &str {
        self.client_id.as_str()
    }

    /// The token to put in the next request.
    pub fn current(&self) -> String {
        self.token.read().secret().to_string()
    }

    /// Unconditionally fetches a new token and makes it current.
    pub async fn regenerate(&self) -> Result<(), Error> {
        let _guard = self.refresh_lock.lock().await;
        self.regenerate_locked().await
    }

    /// Regenerates after `stale` was rejected, unless another caller already
    /// replaced it while we waited for the refresh lock.
    pub async fn regenerate_if_current(&self, stale: &str) -> Result<(), Error> {
        let _guard = self.refresh_lock.lock().await;
        if self.token.read().secret() != stale {
            debug!("[TwitchAuth] token already refreshed by a concurrent caller");
            return Ok(());
        }
        self.regenerate_locked().await
    }

    async fn regenerate_locked(&self) -> Result<(), Error> {
        info!("[TwitchAuth] token invalid, generating a new one");
        let fresh = self
            .source
            .generate(self.client_id.as_str(), self.client_secret.secret())
            .await?;
        *self.token.write() = AccessToken::new(fresh);
        Ok(())
    }

    /// One pass of the periodic check: validate, regenerate if rejected.
    /// Failures are logged and left for the next pass.
    pub async fn validate_or_regenerate(&self) {
        let token = self.current();
        match self.source.validate(&token).await {
            Ok(true) => debug!("[TwitchAuth] app access token still valid"),
            Ok(false) => {
                if let Err(e) = self.regenerate_if_current(&token).await {
                    error!("[TwitchAuth] could not generate token: {}", e);
                }
            }
            Err(e) => warn!("[TwitchAuth] could not validate token: {}", e),
        }
    }
}
