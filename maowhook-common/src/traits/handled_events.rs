// File: maowhook-common/src/traits/handled_events.rs

use async_trait::async_trait;

/// Remembers which webhook message IDs have already been processed.
///
/// Twitch delivers notifications at least once, so the same message ID can arrive
/// more than once. Implementations must be safe to call from concurrent requests.
#[async_trait]
pub trait HandledEventsChecker: Send + Sync {
    async fn is_handled(&self, message_id: &str) -> bool;
    async fn mark_handled(&self, message_id: &str);

    /// Marks `message_id` as handled and returns `true` if it was not handled before.
    ///
    /// The provided version is check-then-mark; implementations backed by a set with
    /// an atomic insert should override it.
    async fn mark_if_new(&self, message_id: &str) -> bool {
        if self.is_handled(message_id).await {
            return false;
        }
        self.mark_handled(message_id).await;
        true
    }
}
