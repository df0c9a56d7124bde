// File: maowhook-core/src/cache/handled_events.rs
//
// In-process stores for webhook message IDs that have already been delivered.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use maowhook_common::traits::HandledEventsChecker;

/// Default checker: an append-only set that lives as long as the process.
///
/// Nothing is ever evicted. Use [`BoundedHandledEvents`] or an external store if
/// the process runs long enough for that to matter.
#[derive(Default)]
pub struct InMemoryHandledEvents {
    handled: RwLock<HashSet<String>>,
}

impl InMemoryHandledEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handled.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handled.read().is_empty()
    }
}

#[async_trait]
impl HandledEventsChecker for InMemoryHandledEvents {
    async fn is_handled(&self, message_id: &str) -> bool {
        self.handled.read().contains(message_id)
    }

    async fn mark_handled(&self, message_id: &str) {
        self.handled.write().insert(message_id.to_string());
    }

    async fn mark_if_new(&self, message_id: &str) -> bool {
        self.handled.write().insert(message_id.to_string())
    }
}

struct BoundedInner {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

/// Same contract as [`InMemoryHandledEvents`] but forgets the oldest IDs once
/// `capacity` is reached.
///
/// Twitch retries a failed delivery for a limited time only, so a capacity that
/// covers a few minutes of traffic is enough in practice.
pub struct BoundedHandledEvents {
    capacity: usize,
    inner: RwLock<BoundedInner>,
}

impl BoundedHandledEvents {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: RwLock::new(BoundedInner {
                seen: HashSet::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().order.is_empty()
    }

    fn insert(&self, message_id: &str) -> bool {
        let mut inner = self.inner.write();
        if !inner.seen.insert(message_id.to_string()) {
            return false;
        }
        inner.order.push_back(message_id.to_string());
        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                trace!("evicting handled message id {}", evicted);
                inner.seen.remove(&evicted);
            }
        }
        true
    }
}

#[async_trait]
impl HandledEventsChecker for BoundedHandledEvents {
    async fn is_handled(&self, message_id: &str) -> bool {
        self.inner.read().seen.contains(message_id)
    }

    async fn mark_handled(&self, message_id: &str) {
        self.insert(message_id);
    }

    async fn mark_if_new(&self, message_id: &str) -> bool {
        self.insert(message_id)
    }
}
