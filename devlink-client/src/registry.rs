//! Pending-request registry.
//!
//! Tracks every in-flight request by correlation key and arbitrates the
//! race between response arrival, timeout expiry, and cancellation. Each
//! key settles exactly once: removal from the concurrent map is the single
//! serialization point, so whichever outcome removes the entry first wins
//! and the loser observes a no-op.

use crate::error::ClientError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use devlink_protocol::{CorrelationKey, Message};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Terminal outcome delivered to the caller waiting on a request.
#[derive(Debug)]
pub enum Settlement {
    /// A matching response arrived before the deadline.
    Resolved(Message),
    /// The deadline elapsed with no matching response.
    TimedOut,
    /// The wait was abandoned, e.g. on client shutdown.
    Cancelled,
}

struct PendingEntry {
    tx: oneshot::Sender<Settlement>,
    created_at: Instant,
    deadline: Instant,
}

/// Concurrent map from correlation key to in-flight request state.
///
/// Supports independent progress across unrelated keys; no operation
/// holds a lock across more than one key.
pub struct PendingRequests {
    entries: DashMap<CorrelationKey, PendingEntry>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Registers a new pending request and arms its timeout timer.
    ///
    /// Fails with [`ClientError::DuplicateKey`] if the key is already
    /// pending; the caller must pick a fresh serial. The timer holds only
    /// a weak handle, so dropping the registry drops outstanding timers
    /// with it.
    pub fn register(
        self: Arc<Self>,
        key: CorrelationKey,
        timeout: Duration,
    ) -> Result<oneshot::Receiver<Settlement>, ClientError> {
        let now = Instant::now();
        let deadline = now + timeout;
        let (tx, rx) = oneshot::channel();

        match self.entries.entry(key) {
            Entry::Occupied(_) => {
                tracing::warn!("correlation key {} is already pending", key);
                return Err(ClientError::DuplicateKey(key));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(PendingEntry {
                    tx,
                    created_at: now,
                    deadline,
                });
            }
        }

        let registry: Weak<Self> = Arc::downgrade(&self);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(registry) = registry.upgrade() {
                registry.expire(key);
            }
        });

        Ok(rx)
    }

    /// Delivers a response to the waiter for `key`.
    ///
    /// Returns `false` without any other action when the key is not
    /// pending: the frame is a duplicate delivery, a stray, or lost the
    /// race against timeout. That is not an error.
    pub fn resolve(&self, key: CorrelationKey, message: Message) -> bool {
        match self.entries.remove(&key) {
            Some((_, entry)) => {
                tracing::debug!(
                    "resolved {} after {:?}",
                    key,
                    entry.created_at.elapsed()
                );
                let _ = entry.tx.send(Settlement::Resolved(message));
                true
            }
            None => {
                tracing::debug!("no pending request for {}, dropping response", key);
                false
            }
        }
    }

    /// Times out the entry for `key` if it is still pending. No-op when
    /// the entry already settled.
    pub fn expire(&self, key: CorrelationKey) -> bool {
        match self.entries.remove(&key) {
            Some((_, entry)) => {
                tracing::debug!(
                    "request {} timed out after {:?}",
                    key,
                    entry.deadline.duration_since(entry.created_at)
                );
                let _ = entry.tx.send(Settlement::TimedOut);
                true
            }
            None => false,
        }
    }

    /// Abandons the wait for `key` before completion or timeout. No-op
    /// when the entry already settled.
    pub fn cancel(&self, key: CorrelationKey) -> bool {
        match self.entries.remove(&key) {
            Some((_, entry)) => {
                let _ = entry.tx.send(Settlement::Cancelled);
                true
            }
            None => false,
        }
    }

    /// Releases every pending waiter promptly, e.g. on shutdown.
    pub fn cancel_all(&self) {
        let keys: Vec<CorrelationKey> = self.entries.iter().map(|e| *e.key()).collect();
        tracing::debug!("cancelling {} pending requests", keys.len());
        for key in keys {
            self.cancel(key);
        }
    }

    /// Returns whether `key` is currently pending.
    pub fn contains(&self, key: CorrelationKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Returns the number of pending requests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new()
    }
}
