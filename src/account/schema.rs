//! Schema initialization
//!
//! Idempotent DDL applied at startup (and by integration tests). The balance
//! column carries a `CHECK (balance >= 0)` as a last line of defense; the
//! engine's locked re-check is what actually prevents overdrafts.

use sqlx::PgPool;

use super::models::UserKind;
use super::repository::{StoreError, UserRepository, WalletRepository};
use crate::money::Money;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          UUID PRIMARY KEY,
    name        TEXT NOT NULL,
    kind        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_WALLETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wallets (
    id          UUID PRIMARY KEY,
    user_id     UUID NOT NULL UNIQUE REFERENCES users(id),
    balance     NUMERIC(14,2) NOT NULL DEFAULT 0 CHECK (balance >= 0),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id              UUID PRIMARY KEY,
    payer_wallet_id UUID REFERENCES wallets(id),
    payee_wallet_id UUID REFERENCES wallets(id),
    amount          NUMERIC(14,2) NOT NULL,
    status          TEXT NOT NULL,
    failure_reason  TEXT,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Apply the schema
pub async fn init(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing PostgreSQL schema");

    sqlx::query(CREATE_USERS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_WALLETS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_TRANSACTIONS_TABLE).execute(pool).await?;

    Ok(())
}

/// Seed a funded common user and a merchant for local development.
/// No-op when users already exist.
pub async fn seed_demo_users(pool: &PgPool) -> Result<(), StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .map_err(StoreError::Database)?;

    if count > 0 {
        tracing::info!(users = count, "Skipping seed, users already present");
        return Ok(());
    }

    let users = UserRepository::new(pool.clone());
    let wallets = WalletRepository::new(pool.clone());

    let payer = users.create("Ada Customer", UserKind::Common).await?;
    wallets
        .create(payer.id, &Money::parse("1000.00").expect("valid seed amount"))
        .await?;

    let merchant = users.create("Babbage Goods", UserKind::Merchant).await?;
    wallets.create(merchant.id, &Money::ZERO).await?;

    tracing::info!(
        payer = %payer.id,
        merchant = %merchant.id,
        "Seeded demo users"
    );

    Ok(())
}
