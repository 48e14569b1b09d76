//! Ledger - transfer audit log
//!
//! Every transfer attempt that reaches the balance phase leaves exactly one
//! immutable row: `completed` inside the transfer's own transaction, or
//! `failed` appended afterwards on the pool (never inside the rolled-back
//! transaction). Rows are never updated.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use std::fmt;
use uuid::Uuid;

use crate::money::Money;

/// Terminal outcome of a transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable transfer record.
///
/// Wallet references are nullable: a failed attempt records whatever could be
/// resolved at the time of failure.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub payer_wallet_id: Option<Uuid>,
    pub payee_wallet_id: Option<Uuid>,
    pub amount: Money,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only access to the transactions table
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a `completed` row inside the transfer's transaction.
    pub async fn create_completed(
        &self,
        conn: &mut PgConnection,
        payer_wallet_id: Uuid,
        payee_wallet_id: Uuid,
        amount: &Money,
    ) -> Result<Transaction, sqlx::Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (id, payer_wallet_id, payee_wallet_id, amount, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, payer_wallet_id, payee_wallet_id, amount, status, failure_reason, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(payer_wallet_id)
        .bind(payee_wallet_id)
        .bind(amount.inner())
        .bind(TransactionStatus::Completed.as_str())
        .fetch_one(&mut *conn)
        .await?;

        row_to_transaction(row)
    }

    /// Append a `failed` row on the pool, outside any rolled-back transaction.
    pub async fn create_failed(
        &self,
        payer_wallet_id: Option<Uuid>,
        payee_wallet_id: Option<Uuid>,
        amount: &Money,
        reason: &str,
    ) -> Result<Transaction, sqlx::Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (id, payer_wallet_id, payee_wallet_id, amount, status, failure_reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, payer_wallet_id, payee_wallet_id, amount, status, failure_reason, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(payer_wallet_id)
        .bind(payee_wallet_id)
        .bind(amount.inner())
        .bind(TransactionStatus::Failed.as_str())
        .bind(reason)
        .fetch_one(&self.pool)
        .await?;

        row_to_transaction(row)
    }

    /// All rows touching a wallet, newest first (audit queries, tests)
    pub async fn find_for_wallet(&self, wallet_id: Uuid) -> Result<Vec<Transaction>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, payer_wallet_id, payee_wallet_id, amount, status, failure_reason, created_at
            FROM transactions
            WHERE payer_wallet_id = $1 OR payee_wallet_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(wallet_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_transaction).collect()
    }
}

fn row_to_transaction(row: PgRow) -> Result<Transaction, sqlx::Error> {
    let status_code: String = row.get("status");
    let status = TransactionStatus::from_code(&status_code).ok_or_else(|| {
        sqlx::Error::Decode(format!("invalid transaction status: {}", status_code).into())
    })?;

    let amount: Decimal = row.get("amount");
    let amount = Money::from_decimal(amount)
        .map_err(|e| sqlx::Error::Decode(format!("invalid amount: {}", e).into()))?;

    Ok(Transaction {
        id: row.get("id"),
        payer_wallet_id: row.get("payer_wallet_id"),
        payee_wallet_id: row.get("payee_wallet_id"),
        amount,
        status,
        failure_reason: row.get("failure_reason"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        assert_eq!(
            TransactionStatus::from_code("completed"),
            Some(TransactionStatus::Completed)
        );
        assert_eq!(
            TransactionStatus::from_code("failed"),
            Some(TransactionStatus::Failed)
        );
        assert_eq!(TransactionStatus::from_code("pending"), None);
    }

    #[test]
    fn transaction_serializes_amount_as_string() {
        let txn = Transaction {
            id: Uuid::nil(),
            payer_wallet_id: Some(Uuid::nil()),
            payee_wallet_id: Some(Uuid::nil()),
            amount: Money::parse("50.00").unwrap(),
            status: TransactionStatus::Completed,
            failure_reason: None,
            created_at: DateTime::<Utc>::MIN_UTC,
        };

        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["amount"], "50.00");
        assert_eq!(json["status"], "completed");
        assert!(json.get("failure_reason").is_none());
    }
}
