// File: maowhook-common/src/traits/auth_traits.rs

use async_trait::async_trait;

use crate::error::Error;

/// Issues and validates the app access token used against Helix.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtains a fresh app access token.
    async fn generate(&self, client_id: &str, client_secret: &str) -> Result<String, Error>;

    /// Asks the issuer whether `token` is still accepted.
    /// `Ok(false)` means rejected; `Err` means the question could not be answered.
    async fn validate(&self, token: &str) -> Result<bool, Error>;
}
