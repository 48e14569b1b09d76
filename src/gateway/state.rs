use std::sync::Arc;

use crate::account::Database;
use crate::idempotency::IdempotencyGate;
use crate::transfer::TransferEngine;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TransferEngine>,
    pub gate: Arc<IdempotencyGate>,
    pub db: Database,
}

impl AppState {
    pub fn new(engine: Arc<TransferEngine>, gate: Arc<IdempotencyGate>, db: Database) -> Self {
        Self { engine, gate, db }
    }
}
