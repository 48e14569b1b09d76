//! Notification Dispatch
//!
//! Fire-and-forget delivery of "transaction completed" messages. The engine
//! calls [`NotificationDispatcher::dispatch`] only after its storage
//! transaction has committed; delivery retries happen on a spawned task with
//! their own backoff schedule and never affect the transfer outcome.

use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::NotificationConfig;
use crate::ledger::Transaction;

/// Event emitted once per committed transfer
#[derive(Debug, Clone, Serialize)]
pub struct TransactionCompleted {
    pub transaction: Transaction,
    pub payer_id: Uuid,
    pub payee_id: Uuid,
}

/// Seam for the external notification service
pub trait NotificationDispatcher: Send + Sync {
    /// Queue the event for delivery. Must not block and must not fail the
    /// caller; called strictly after commit.
    fn dispatch(&self, event: TransactionCompleted);
}

/// HTTP dispatcher: spawns a delivery task per event.
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
    max_attempts: u32,
    backoff: Vec<Duration>,
}

impl HttpNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            max_attempts: config.max_attempts.max(1),
            backoff: config
                .backoff_secs
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        })
    }

    async fn deliver(
        client: reqwest::Client,
        url: String,
        max_attempts: u32,
        backoff: Vec<Duration>,
        event: TransactionCompleted,
    ) {
        let transaction_id = event.transaction.id;

        for attempt in 1..=max_attempts {
            match client.post(&url).json(&event).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!(transaction_id = %transaction_id, "Notification delivered");
                    return;
                }
                Ok(resp) => {
                    warn!(
                        transaction_id = %transaction_id,
                        status = %resp.status(),
                        attempt,
                        "Notification rejected"
                    );
                }
                Err(e) => {
                    warn!(
                        transaction_id = %transaction_id,
                        error = %e,
                        attempt,
                        "Notification request failed"
                    );
                }
            }

            if attempt < max_attempts {
                // Last backoff value repeats when attempts outnumber entries
                let idx = (attempt as usize - 1).min(backoff.len().saturating_sub(1));
                if let Some(delay) = backoff.get(idx) {
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        error!(
            transaction_id = %transaction_id,
            attempts = max_attempts,
            "Notification failed permanently"
        );
    }
}

impl NotificationDispatcher for HttpNotifier {
    fn dispatch(&self, event: TransactionCompleted) {
        let client = self.client.clone();
        let url = self.url.clone();
        let max_attempts = self.max_attempts;
        let backoff = self.backoff.clone();

        tokio::spawn(Self::deliver(client, url, max_attempts, backoff, event));
    }
}

/// Test dispatcher: records events instead of delivering them
#[derive(Default)]
pub struct RecordingDispatcher {
    events: std::sync::Mutex<Vec<TransactionCompleted>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TransactionCompleted> {
        self.events.lock().unwrap().clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn dispatch(&self, event: TransactionCompleted) {
        self.events.lock().unwrap().push(event);
    }
}
