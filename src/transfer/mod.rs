//! Funds Transfer Engine
//!
//! Moves money between two wallets with strict guarantees:
//! - no negative balances, enforced under held row locks
//! - no double-spend across concurrent requests (canonical lock order)
//! - mandatory external authorization before any mutation
//! - exactly one immutable ledger row per attempt that reaches the balance phase
//! - notification dispatched only after a durable commit

pub mod authorizer;
pub mod engine;
pub mod error;
pub mod notifier;

#[cfg(test)]
mod integration_tests;

pub use authorizer::{Authorizer, HttpAuthorizer, MockAuthorizer, MockOutcome};
pub use engine::{TransferEngine, TransferOrder};
pub use error::TransferError;
pub use notifier::{HttpNotifier, NotificationDispatcher, RecordingDispatcher, TransactionCompleted};
