//! Transfer Engine
//!
//! Orchestrates one wallet-to-wallet transfer:
//!
//! ```text
//! Validating -> Authorizing -> Locking -> Mutating -> Recording -> Committed
//!       \____________________________________________________/
//!                               Failed(reason)
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Authorize before mutate**: the external oracle clears the transfer
//!    before any storage transaction opens.
//! 2. **Locked check is authoritative**: the unlocked pre-check is advisory;
//!    the balance is re-checked after both row locks are held, so two
//!    concurrent transfers can never jointly overdraw a wallet.
//! 3. **Canonical lock order**: both wallets lock in wallet-id order,
//!    independent of payer/payee direction (deadlock freedom).
//! 4. **Side effects after commit only**: the notification dispatches strictly
//!    after a successful commit, never on rollback.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::authorizer::Authorizer;
use super::error::TransferError;
use super::notifier::{NotificationDispatcher, TransactionCompleted};
use crate::account::{Database, UserRepository, Wallet, WalletRepository};
use crate::ledger::{Transaction, TransactionRepository};
use crate::money::Money;

/// One validated transfer request
#[derive(Debug, Clone)]
pub struct TransferOrder {
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub amount: Money,
}

impl TransferOrder {
    pub fn new(payer_id: Uuid, payee_id: Uuid, amount: Money) -> Self {
        Self {
            payer_id,
            payee_id,
            amount,
        }
    }
}

/// The funds-transfer engine.
///
/// All collaborators are injected handles; the engine owns transaction scope
/// and lock acquisition.
pub struct TransferEngine {
    db: Database,
    users: Arc<UserRepository>,
    wallets: Arc<WalletRepository>,
    transactions: Arc<TransactionRepository>,
    authorizer: Arc<dyn Authorizer>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl TransferEngine {
    pub fn new(
        db: Database,
        users: Arc<UserRepository>,
        wallets: Arc<WalletRepository>,
        transactions: Arc<TransactionRepository>,
        authorizer: Arc<dyn Authorizer>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            db,
            users,
            wallets,
            transactions,
            authorizer,
            notifier,
        }
    }

    /// Execute a transfer to its terminal state.
    ///
    /// Returns the committed `completed` transaction, or the first error on
    /// the way there. Failures from the balance phase leave a `failed` ledger
    /// row behind (best effort); validation and authorization failures do not.
    pub async fn execute(&self, order: TransferOrder) -> Result<Transaction, TransferError> {
        // === Validating ===
        if order.payer_id == order.payee_id {
            return Err(TransferError::SelfTransfer);
        }
        if order.amount.is_zero() {
            return Err(TransferError::InvalidAmount);
        }

        let payer = self
            .users
            .find(order.payer_id)
            .await?
            .ok_or(TransferError::UserNotFound(order.payer_id))?;

        if !payer.kind.can_transfer() {
            return Err(TransferError::MerchantPayer);
        }

        let wallets = self
            .wallets
            .find_many_for_owners(&[order.payer_id, order.payee_id])
            .await?;
        let payer_wallet = owner_wallet(&wallets, order.payer_id)?;
        let payee_wallet = owner_wallet(&wallets, order.payee_id)?;

        // Advisory fast-fail; the locked re-check below is the one that counts
        if !payer_wallet.balance.is_gte(&order.amount) {
            let err = TransferError::InsufficientBalance;
            self.record_failure(Some(payer_wallet.id), Some(payee_wallet.id), &order, &err)
                .await;
            return Err(err);
        }

        // === Authorizing ===
        // Aborts before any storage transaction; leaves no ledger row
        self.authorizer.authorize().await?;

        // === Locking / Mutating / Recording / Committed ===
        match self.transfer_locked(&order).await {
            Ok(transaction) => {
                info!(
                    transaction_id = %transaction.id,
                    payer = %order.payer_id,
                    payee = %order.payee_id,
                    amount = %order.amount,
                    "Transfer committed"
                );

                // Post-commit hook: runs only once the commit succeeded
                self.notifier.dispatch(TransactionCompleted {
                    transaction: transaction.clone(),
                    payer_id: order.payer_id,
                    payee_id: order.payee_id,
                });

                Ok(transaction)
            }
            Err(e) => {
                self.record_failure(Some(payer_wallet.id), Some(payee_wallet.id), &order, &e)
                    .await;
                Err(e)
            }
        }
    }

    /// The locked section: both wallet rows are held from the balance check
    /// through the ledger append, all inside one storage transaction.
    async fn transfer_locked(&self, order: &TransferOrder) -> Result<Transaction, TransferError> {
        let mut tx = self.db.pool().begin().await?;

        let wallets = self
            .wallets
            .find_many_for_owners_locked(&mut tx, &[order.payer_id, order.payee_id])
            .await?;
        let payer_wallet = owner_wallet(&wallets, order.payer_id)?;
        let payee_wallet = owner_wallet(&wallets, order.payee_id)?;

        // Authoritative balance check, now under both locks
        if !payer_wallet.balance.is_gte(&order.amount) {
            return Err(TransferError::InsufficientBalance);
        }

        self.wallets
            .debit(&mut tx, payer_wallet.id, &order.amount)
            .await?;
        self.wallets
            .credit(&mut tx, payee_wallet.id, &order.amount)
            .await?;

        let transaction = self
            .transactions
            .create_completed(&mut tx, payer_wallet.id, payee_wallet.id, &order.amount)
            .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    /// Best-effort `failed` ledger row. Recording errors are swallowed so they
    /// never mask the original failure.
    async fn record_failure(
        &self,
        payer_wallet_id: Option<Uuid>,
        payee_wallet_id: Option<Uuid>,
        order: &TransferOrder,
        error: &TransferError,
    ) {
        if let Err(e) = self
            .transactions
            .create_failed(
                payer_wallet_id,
                payee_wallet_id,
                &order.amount,
                &error.to_string(),
            )
            .await
        {
            warn!(
                payer = %order.payer_id,
                payee = %order.payee_id,
                error = %e,
                "Could not record failed transaction"
            );
        }
    }
}

fn owner_wallet(wallets: &[Wallet], user_id: Uuid) -> Result<&Wallet, TransferError> {
    wallets
        .iter()
        .find(|w| w.user_id == user_id)
        .ok_or(TransferError::WalletNotFound(user_id))
}
