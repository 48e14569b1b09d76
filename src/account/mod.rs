//! Account management: users (wallet owners) and wallets.
//!
//! Wallet balances are the only contended mutable state in the system. They
//! are read without locks for advisory pre-checks and with `FOR UPDATE` row
//! locks (canonical id order) for the authoritative check-and-mutate path.

pub mod db;
pub mod models;
pub mod repository;
pub mod schema;

pub use db::Database;
pub use models::{User, UserKind, Wallet};
pub use repository::{StoreError, UserRepository, WalletRepository};
