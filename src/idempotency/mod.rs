//! Idempotency Gate
//!
//! Sits in front of the transfer engine at the request boundary and
//! deduplicates externally retried requests keyed by a caller-supplied token:
//!
//! - no token: process normally, never cache
//! - cached response for the token: replay it verbatim, skip the engine
//! - another request in flight for the token: conflict, immediately
//! - otherwise: run the request under a short-lived per-token lock and cache
//!   successful responses for a day
//!
//! Failed (non-2xx) responses are never cached, so the same token can retry
//! a failed attempt.

pub mod store;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub use store::{IdempotencyStore, InMemoryIdempotencyStore, StoredResponse};

use crate::config::IdempotencyConfig;

/// How the gate resolved a request
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Handler ran now
    Fresh(StoredResponse),
    /// Served from the response cache, handler skipped
    Replayed(StoredResponse),
    /// Another request holds the token's lock
    InFlight,
}

/// Request-boundary deduplication gate
pub struct IdempotencyGate {
    store: Arc<dyn IdempotencyStore>,
    response_ttl: Duration,
    lock_ttl: Duration,
}

impl IdempotencyGate {
    pub fn new(store: Arc<dyn IdempotencyStore>, config: &IdempotencyConfig) -> Self {
        Self {
            store,
            response_ttl: Duration::from_secs(config.response_ttl_secs),
            lock_ttl: Duration::from_secs(config.lock_ttl_secs),
        }
    }

    /// Run `handler` through the gate.
    ///
    /// The per-token lock is released on every exit path; the handler encodes
    /// failures in the response status, so there is no error path that could
    /// leak the lock.
    pub async fn execute<F, Fut>(&self, key: Option<&str>, handler: F) -> GateOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoredResponse>,
    {
        let Some(key) = key else {
            return GateOutcome::Fresh(handler().await);
        };

        if let Some(cached) = self.store.get(key).await {
            debug!(key, "Idempotency cache hit - replaying response");
            return GateOutcome::Replayed(cached);
        }

        if !self.store.try_lock(key, self.lock_ttl).await {
            debug!(key, "Idempotency lock busy - rejecting");
            return GateOutcome::InFlight;
        }

        let response = handler().await;

        if response.is_success() {
            self.store
                .put(key, response.clone(), self.response_ttl)
                .await;
        }

        self.store.release(key).await;

        GateOutcome::Fresh(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    fn gate() -> IdempotencyGate {
        IdempotencyGate::new(
            Arc::new(InMemoryIdempotencyStore::new()),
            &IdempotencyConfig::default(),
        )
    }

    fn ok_response() -> StoredResponse {
        StoredResponse::new(201, json!({"status": "completed"}))
    }

    #[tokio::test]
    async fn no_key_bypasses_cache() {
        let gate = gate();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let outcome = gate
                .execute(None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    ok_response()
                })
                .await;
            assert!(matches!(outcome, GateOutcome::Fresh(_)));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn replay_returns_identical_response_without_reinvoking() {
        let gate = gate();
        let calls = AtomicUsize::new(0);

        let first = gate
            .execute(Some("key-1"), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                ok_response()
            })
            .await;
        let second = gate
            .execute(Some("key-1"), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                StoredResponse::new(500, json!({"should": "not run"}))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let GateOutcome::Fresh(first) = first else {
            panic!("expected fresh outcome");
        };
        let GateOutcome::Replayed(second) = second else {
            panic!("expected replayed outcome");
        };
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_responses_are_retryable() {
        let gate = gate();

        let first = gate
            .execute(Some("key-2"), || async {
                StoredResponse::new(400, json!({"error": "INSUFFICIENT_BALANCE"}))
            })
            .await;
        assert!(matches!(first, GateOutcome::Fresh(r) if r.status == 400));

        // Same token runs the handler again
        let second = gate.execute(Some("key-2"), || async { ok_response() }).await;
        assert!(matches!(second, GateOutcome::Fresh(r) if r.status == 201));
    }

    #[tokio::test]
    async fn busy_token_conflicts_immediately() {
        let gate = Arc::new(gate());
        let barrier = Arc::new(Barrier::new(2));

        let slow_gate = gate.clone();
        let slow_barrier = barrier.clone();
        let slow = tokio::spawn(async move {
            slow_gate
                .execute(Some("key-3"), || async {
                    slow_barrier.wait().await;
                    // Hold the lock until the other request has been rejected
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    ok_response()
                })
                .await
        });

        barrier.wait().await;
        let outcome = gate.execute(Some("key-3"), || async { ok_response() }).await;
        assert_eq!(outcome, GateOutcome::InFlight);

        assert!(matches!(
            slow.await.unwrap(),
            GateOutcome::Fresh(r) if r.status == 201
        ));
    }

    #[tokio::test]
    async fn concurrent_same_key_admits_exactly_one() {
        let gate = Arc::new(gate());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            let calls = calls.clone();
            let barrier = barrier.clone();
            tasks.push(tokio::spawn(async move {
                barrier.wait().await;
                gate.execute(Some("key-4"), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    ok_response()
                })
                .await
            }));
        }

        let mut fresh = 0;
        let mut in_flight = 0;
        for task in tasks {
            match task.await.unwrap() {
                GateOutcome::Fresh(_) => fresh += 1,
                GateOutcome::InFlight => in_flight += 1,
                GateOutcome::Replayed(_) => panic!("no replay expected"),
            }
        }

        assert_eq!(fresh, 1);
        assert_eq!(in_flight, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
