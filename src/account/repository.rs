//! User and Wallet repositories
//!
//! Wallet reads come in two flavors: unlocked (advisory pre-checks) and locked
//! (`SELECT ... FOR UPDATE`). Locked reads always order by wallet id — that is
//! the canonical system-wide lock order, so two concurrent transfers touching
//! the same pair of wallets in opposite directions cannot deadlock.
//!
//! `debit`/`credit` do not lock. The caller must already hold the row lock
//! inside the same transaction, which is why both take the transaction's
//! connection rather than the pool.

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use super::models::{User, UserKind, Wallet};
use crate::money::{Money, MoneyError};

/// Store-level errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),

    #[error("Corrupt balance value: {0}")]
    CorruptBalance(#[from] MoneyError),
}

/// Read-only user lookups
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, name, kind, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_user).transpose()
    }

    /// Insert a user (seeding and tests; account opening is out of scope here)
    pub async fn create(&self, name: &str, kind: UserKind) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, name, kind)
            VALUES ($1, $2, $3)
            RETURNING id, name, kind, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        row_to_user(row)
    }
}

/// Wallet reads and balance mutations
pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Unlocked read, advisory only
    pub async fn find_for_owner(&self, user_id: Uuid) -> Result<Option<Wallet>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, balance, updated_at FROM wallets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_wallet).transpose()
    }

    /// Unlocked batch read, advisory only
    pub async fn find_many_for_owners(&self, user_ids: &[Uuid]) -> Result<Vec<Wallet>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, user_id, balance, updated_at FROM wallets WHERE user_id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_wallet).collect()
    }

    /// Locked single-wallet read inside the caller's transaction
    pub async fn find_for_owner_locked(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<Wallet>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, balance, updated_at FROM wallets WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(row_to_wallet).transpose()
    }

    /// Locked batch read inside the caller's transaction.
    ///
    /// `ORDER BY id` fixes the lock acquisition order: every transfer locks
    /// overlapping wallets in the same sequence regardless of payer/payee
    /// direction.
    pub async fn find_many_for_owners_locked(
        &self,
        conn: &mut PgConnection,
        user_ids: &[Uuid],
    ) -> Result<Vec<Wallet>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, balance, updated_at FROM wallets
            WHERE user_id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(user_ids)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(row_to_wallet).collect()
    }

    /// Subtract `amount` from the wallet balance. Caller holds the row lock.
    pub async fn debit(
        &self,
        conn: &mut PgConnection,
        wallet_id: Uuid,
        amount: &Money,
    ) -> Result<(), StoreError> {
        let balance = self.balance_of(conn, wallet_id).await?;
        let new_balance = balance.subtract(amount)?;
        self.store_balance(conn, wallet_id, &new_balance).await
    }

    /// Add `amount` to the wallet balance. Caller holds the row lock.
    pub async fn credit(
        &self,
        conn: &mut PgConnection,
        wallet_id: Uuid,
        amount: &Money,
    ) -> Result<(), StoreError> {
        let balance = self.balance_of(conn, wallet_id).await?;
        let new_balance = balance.add(amount);
        self.store_balance(conn, wallet_id, &new_balance).await
    }

    /// Insert a wallet (seeding and tests)
    pub async fn create(&self, user_id: Uuid, balance: &Money) -> Result<Wallet, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO wallets (id, user_id, balance)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, balance, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(balance.inner())
        .fetch_one(&self.pool)
        .await?;

        row_to_wallet(row)
    }

    async fn balance_of(
        &self,
        conn: &mut PgConnection,
        wallet_id: Uuid,
    ) -> Result<Money, StoreError> {
        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM wallets WHERE id = $1")
                .bind(wallet_id)
                .fetch_optional(&mut *conn)
                .await?;

        let balance = balance.ok_or(StoreError::WalletNotFound(wallet_id))?;
        Ok(Money::from_decimal(balance)?)
    }

    async fn store_balance(
        &self,
        conn: &mut PgConnection,
        wallet_id: Uuid,
        balance: &Money,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE wallets SET balance = $1, updated_at = NOW() WHERE id = $2")
            .bind(balance.inner())
            .bind(wallet_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

fn row_to_user(row: PgRow) -> Result<User, StoreError> {
    let kind_code: String = row.get("kind");
    let kind = UserKind::from_code(&kind_code).ok_or_else(|| {
        StoreError::Database(sqlx::Error::Decode(
            format!("invalid user kind: {}", kind_code).into(),
        ))
    })?;

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        kind,
        created_at: row.get("created_at"),
    })
}

fn row_to_wallet(row: PgRow) -> Result<Wallet, StoreError> {
    let balance: Decimal = row.get("balance");

    Ok(Wallet {
        id: row.get("id"),
        user_id: row.get("user_id"),
        balance: Money::from_decimal(balance)?,
        updated_at: row.get("updated_at"),
    })
}
