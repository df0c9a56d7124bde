// File: maowhook-core/src/tasks/credential_refresh.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::auth::CredentialManager;

/// How often the app access token is validated in the background.
pub const DEFAULT_VALIDATION_INTERVAL: Duration = Duration::from_secs(3600);

/// Owns the background validation loop. Dropping the handle stops the loop.
pub struct CredentialTaskHandle {
    shutdown_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl CredentialTaskHandle {
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map(|j| j.is_finished()).unwrap_or(true)
    }

    /// Signals the loop to stop and waits for it to exit.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for CredentialTaskHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Spawns a task that validates the current token every `every`, regenerating it
/// when Twitch no longer accepts it. The first check happens one full period after start.
pub fn spawn_credential_validation_task(
    credentials: Arc<CredentialManager>,
    every: Duration,
) -> CredentialTaskHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let join = tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    debug!("[TwitchAuth] periodic token validation");
                    credentials.validate_or_regenerate().await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        info!("[TwitchAuth] token validation task stopped");
    });

    CredentialTaskHandle {
        shutdown_tx,
        join: Some(join),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use maowhook_common::traits::TokenSource;
    use maowhook_common::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RejectingSource {
        validated: AtomicUsize,
        generated: AtomicUsize,
    }

    #[async_trait]
    impl TokenSource for RejectingSource {
        async fn generate(&self, _: &str, _: &str) -> Result<String, Error> {
            let n = self.generated.fetch_add(1, Ordering::SeqCst);
            Ok(format!("token-{n}"))
        }

        async fn validate(&self, _: &str) -> Result<bool, Error> {
            self.validated.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_validates_each_period_and_stops_on_shutdown() {
        let source = Arc::new(RejectingSource {
            validated: AtomicUsize::new(0),
            generated: AtomicUsize::new(0),
        });
        let creds = Arc::new(CredentialManager::init(source.clone(), "cid", "secret").await.unwrap());

        let handle = spawn_credential_validation_task(creds.clone(), Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(source.validated.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.validated.load(Ordering::SeqCst), 1);
        assert_eq!(creds.current(), "token-1");

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.validated.load(Ordering::SeqCst), 2);

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.validated.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_task() {
        let source = Arc::new(RejectingSource {
            validated: AtomicUsize::new(0),
            generated: AtomicUsize::new(0),
        });
        let creds = Arc::new(CredentialManager::init(source.clone(), "cid", "secret").await.unwrap());

        let handle = spawn_credential_validation_task(creds, Duration::from_secs(60));
        drop(handle);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.validated.load(Ordering::SeqCst), 0);
    }
}
