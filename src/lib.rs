//! Payflow - Wallet-to-Wallet Funds Transfer Service
//!
//! Moves money between two wallets with strict correctness guarantees:
//! no negative balances, no double-spend under concurrency, exactly-once
//! effect for retried requests, and mandatory external authorization before
//! any balance mutation.
//!
//! # Modules
//!
//! - [`money`] - fixed 2-decimal Money value type
//! - [`account`] - users, wallets, locked/unlocked reads, debit/credit
//! - [`ledger`] - immutable transaction records
//! - [`transfer`] - the transfer engine, authorization client, notifier
//! - [`idempotency`] - request deduplication gate + cache/lock store
//! - [`gateway`] - axum HTTP surface
//! - [`config`] / [`logging`] - process wiring

pub mod config;
pub mod logging;
pub mod money;

pub mod account;
pub mod gateway;
pub mod idempotency;
pub mod ledger;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::{Database, User, UserKind, UserRepository, Wallet, WalletRepository};
pub use idempotency::{GateOutcome, IdempotencyGate, IdempotencyStore, InMemoryIdempotencyStore};
pub use ledger::{Transaction, TransactionRepository, TransactionStatus};
pub use money::{Money, MoneyError};
pub use transfer::{
    Authorizer, HttpAuthorizer, HttpNotifier, NotificationDispatcher, TransferEngine,
    TransferError, TransferOrder,
};
