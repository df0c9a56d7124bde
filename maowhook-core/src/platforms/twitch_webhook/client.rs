// File: maowhook-core/src/platforms/twitch_webhook/client.rs

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use tracing::{debug, info};

use maowhook_common::models::Subscription;
use maowhook_common::traits::{HandledEventsChecker, TokenSource};

use crate::auth::{CredentialManager, TwitchTokenSource};
use crate::cache::InMemoryHandledEvents;
use crate::config::ClientConfig;
use crate::http::{DefaultHttpClient, HttpClient};
use crate::tasks::credential_refresh::{spawn_credential_validation_task, CredentialTaskHandle};
use crate::Error;

use super::verification::VerificationRendezvous;

/// Receives the raw `event` object of a notification.
pub type EventHandler = Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Called with the revoked subscription. Check `status` for the reason.
pub type RevocationHandler = Arc<dyn Fn(&Subscription) + Send + Sync>;

/// Twitch EventSub client for the webhook transport.
///
/// Create it with [`Client::new`] (or [`ClientBuilder`] to swap out the HTTP
/// client, token source or handled-events store), mount [`Client::router`] in
/// your server, assign handlers with [`Client::on`], then call
/// [`Client::create_subscription`].
///
/// Dropping the client stops its background token validation.
pub struct Client {
    pub(crate) config: ClientConfig,
    pub(crate) http: Arc<dyn HttpClient>,
    pub(crate) credentials: Arc<CredentialManager>,
    pub(crate) handled_events: Arc<dyn HandledEventsChecker>,
    pub(crate) verifications: VerificationRendezvous,
    pub(crate) handlers: DashMap<String, EventHandler>,
    pub(crate) on_revocation: RwLock<Option<RevocationHandler>>,
    _validation_task: CredentialTaskHandle,
}

impl Client {
    /// Builds a client with the reqwest transport, Twitch's token endpoint and
    /// an in-memory handled-events store. Generates the first app access token.
    pub async fn new(config: ClientConfig) -> Result<Self, Error> {
        ClientBuilder::new(config).build().await
    }

    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Assigns the handler for an event type (e.g. `"stream.online"`), replacing any
    /// previous one. Each notification runs the handler on its own task.
    ///
    /// Subscription types: <https://dev.twitch.tv/docs/eventsub/eventsub-subscription-types/>
    pub fn on<F, Fut>(&self, event_type: &str, handler: F)
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: EventHandler =
            Arc::new(move |event| -> BoxFuture<'static, ()> { Box::pin(handler(event)) });
        if self.handlers.insert(event_type.to_string(), handler).is_some() {
            debug!("[EventSub] replaced handler for {}", event_type);
        }
    }

    pub fn remove_handler(&self, event_type: &str) -> bool {
        self.handlers.remove(event_type).is_some()
    }

    /// Fired whenever Twitch revokes a subscription.
    pub fn on_revocation<F>(&self, handler: F)
    where
        F: Fn(&Subscription) + Send + Sync + 'static,
    {
        *self.on_revocation.write() = Some(Arc::new(handler));
    }

    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }

    pub fn webhook_url(&self) -> &str {
        &self.config.webhook_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The app access token currently in use.
    pub fn access_token(&self) -> String {
        self.credentials.current()
    }

    /// Number of `create_subscription` calls still waiting for verification.
    pub fn pending_verifications(&self) -> usize {
        self.verifications.pending()
    }
}

/// Assembles a [`Client`] with pluggable collaborators.
pub struct ClientBuilder {
    config: ClientConfig,
    http: Option<Arc<dyn HttpClient>>,
    token_source: Option<Arc<dyn TokenSource>>,
    handled_events: Option<Arc<dyn HandledEventsChecker>>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: None,
            token_source: None,
            handled_events: None,
        }
    }

    pub fn http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Replaces the default unbounded in-memory store, e.g. with
    /// [`crate::cache::BoundedHandledEvents`] or something persistent.
    pub fn handled_events(mut self, checker: Arc<dyn HandledEventsChecker>) -> Self {
        self.handled_events = Some(checker);
        self
    }

    pub async fn build(self) -> Result<Client, Error> {
        self.config.validate()?;

        let http: Arc<dyn HttpClient> = self
            .http
            .unwrap_or_else(|| Arc::new(DefaultHttpClient::new()));
        let token_source: Arc<dyn TokenSource> = match self.token_source {
            Some(source) => source,
            None => Arc::new(TwitchTokenSource::with_id_url(http.clone(), &self.config.id_url)),
        };
        let handled_events: Arc<dyn HandledEventsChecker> = self
            .handled_events
            .unwrap_or_else(|| Arc::new(InMemoryHandledEvents::new()));

        let credentials = Arc::new(
            CredentialManager::init(
                token_source,
                &self.config.client_id,
                &self.config.client_secret,
            )
            .await?,
        );
        let validation_task = spawn_credential_validation_task(
            credentials.clone(),
            self.config.token_validation_interval,
        );

        info!(
            "[EventSub] webhook client ready, callback={}",
            self.config.webhook_url
        );

        Ok(Client {
            verifications: VerificationRendezvous::new(self.config.verification_timeout),
            config: self.config,
            http,
            credentials,
            handled_events,
            handlers: DashMap::new(),
            on_revocation: RwLock::new(None),
            _validation_task: validation_task,
        })
    }
}
