// File: maowhook-core/src/platforms/twitch_webhook/verification.rs
//
// Hands confirmed subscription IDs from the webhook handler to the
// `create_subscription` call waiting for them.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace};

struct RendezvousState {
    /// Subscription ID -> the create call waiting for it.
    waiters: HashMap<String, oneshot::Sender<()>>,
    /// Confirmations that arrived before anyone was waiting for them.
    early: HashMap<String, Instant>,
}

impl RendezvousState {
    fn prune_early(&mut self, ttl: Duration) {
        let now = Instant::now();
        self.early.retain(|id, at| {
            let keep = now.duration_since(*at) <= ttl;
            if !keep {
                trace!("[EventSub] dropping unclaimed verification for {}", id);
            }
            keep
        });
    }
}

/// Registry of pending verifications keyed by the subscription ID they expect.
///
/// A confirmation only ever completes the waiter for its own ID. Twitch can
/// send the verification request before the 202 reaches us, so confirmations
/// with no waiter are parked for `early_ttl` and consumed by the next
/// `wait_for` with that ID.
pub struct VerificationRendezvous {
    state: Mutex<RendezvousState>,
    early_ttl: Duration,
}

impl VerificationRendezvous {
    pub fn new(early_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(RendezvousState {
                waiters: HashMap::new(),
                early: HashMap::new(),
            }),
            early_ttl,
        }
    }

    /// Publishes a confirmation. Never blocks.
    /// Returns `true` if a waiting create call was woken.
    pub fn confirm(&self, subscription_id: &str) -> bool {
        let mut state = self.state.lock();
        if let Some(tx) = state.waiters.remove(subscription_id) {
            if tx.send(()).is_ok() {
                debug!("[EventSub] verification delivered for {}", subscription_id);
                return true;
            }
        }
        state.prune_early(self.early_ttl);
        state.early.insert(subscription_id.to_string(), Instant::now());
        debug!("[EventSub] no waiter for {} yet, parking verification", subscription_id);
        false
    }

    /// Waits up to `timeout` for the confirmation of `subscription_id`.
    pub async fn wait_for(&self, subscription_id: &str, timeout: Duration) -> bool {
        let rx = {
            let mut state = self.state.lock();
            state.prune_early(self.early_ttl);
            if state.early.remove(subscription_id).is_some() {
                debug!("[EventSub] verification for {} arrived early", subscription_id);
                return true;
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.insert(subscription_id.to_string(), tx);
            rx
        };

        let _guard = WaiterGuard {
            rendezvous: self,
            subscription_id,
        };
        matches!(tokio::time::timeout(timeout, rx).await, Ok(Ok(())))
    }

    /// Number of create calls currently waiting.
    pub fn pending(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Number of parked confirmations nobody has claimed yet.
    pub fn unclaimed(&self) -> usize {
        self.state.lock().early.len()
    }
}

/// Deregisters a waiter on timeout or when the create future is dropped.
struct WaiterGuard<'a> {
    rendezvous: &'a VerificationRendezvous,
    subscription_id: &'a str,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.rendezvous.state.lock().waiters.remove(self.subscription_id);
    }
}
