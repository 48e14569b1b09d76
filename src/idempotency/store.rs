//! Idempotency cache and lock store
//!
//! The gate needs two primitives from its cache/lock provider: a response
//! cache with TTL, and a per-token mutual-exclusion lock with a short TTL.
//! [`InMemoryIdempotencyStore`] is the in-process implementation; a Redis
//! store would implement the same trait.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use std::time::{Duration, Instant};

/// A previously produced response, replayed verbatim on cache hit
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub status: u16,
    pub body: Value,
}

impl StoredResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 2xx responses are the only ones worth caching
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Cache/lock provider seam for the idempotency gate
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Cached response for the token, if present and not expired
    async fn get(&self, key: &str) -> Option<StoredResponse>;

    /// Cache a response under the token
    async fn put(&self, key: &str, response: StoredResponse, ttl: Duration);

    /// Try to take the per-token exclusive lock. Returns false without
    /// waiting when another holder is alive.
    async fn try_lock(&self, key: &str, ttl: Duration) -> bool;

    /// Release the per-token lock
    async fn release(&self, key: &str);
}

/// DashMap-backed store with instant-based expiry.
///
/// Expired entries are dropped lazily on access; the short TTLs and the
/// per-request key space keep the maps small.
#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    responses: DashMap<String, (StoredResponse, Instant)>,
    locks: DashMap<String, Instant>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn get(&self, key: &str) -> Option<StoredResponse> {
        match self.responses.get(key) {
            Some(entry) if entry.value().1 > Instant::now() => Some(entry.value().0.clone()),
            Some(_) => {
                drop(self.responses.remove(key));
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, response: StoredResponse, ttl: Duration) {
        self.responses
            .insert(key.to_string(), (response, Instant::now() + ttl));
    }

    async fn try_lock(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        // The entry API holds the shard lock, making check-and-set atomic
        match self.locks.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if *occupied.get() > now {
                    false
                } else {
                    occupied.insert(now + ttl);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now + ttl);
                true
            }
        }
    }

    async fn release(&self, key: &str) {
        self.locks.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_none_for_missing_and_expired() {
        let store = InMemoryIdempotencyStore::new();
        assert_eq!(store.get("k").await, None);

        store
            .put(
                "k",
                StoredResponse::new(201, serde_json::json!({"ok": true})),
                Duration::from_millis(10),
            )
            .await;
        assert!(store.get("k").await.is_some());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn lock_is_exclusive_until_released() {
        let store = InMemoryIdempotencyStore::new();
        assert!(store.try_lock("k", Duration::from_secs(10)).await);
        assert!(!store.try_lock("k", Duration::from_secs(10)).await);

        store.release("k").await;
        assert!(store.try_lock("k", Duration::from_secs(10)).await);
    }

    #[tokio::test]
    async fn expired_lock_can_be_reacquired() {
        let store = InMemoryIdempotencyStore::new();
        assert!(store.try_lock("k", Duration::from_millis(10)).await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.try_lock("k", Duration::from_secs(10)).await);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let store = InMemoryIdempotencyStore::new();
        assert!(store.try_lock("a", Duration::from_secs(10)).await);
        assert!(store.try_lock("b", Duration::from_secs(10)).await);
    }
}
