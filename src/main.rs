//! Payflow service entry point.
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────────┐
//! │  Config  │──▶│ Postgres  │──▶│  Engine  │──▶│   Gateway    │
//! │  (YAML)  │   │ (schema)  │   │ + Gate   │   │ (axum HTTP)  │
//! └──────────┘   └───────────┘   └──────────┘   └──────────────┘
//! ```

use std::sync::Arc;

use payflow::account::{Database, UserRepository, WalletRepository, schema};
use payflow::config::AppConfig;
use payflow::gateway::{self, AppState};
use payflow::idempotency::{IdempotencyGate, InMemoryIdempotencyStore};
use payflow::ledger::TransactionRepository;
use payflow::logging::init_logging;
use payflow::transfer::{HttpAuthorizer, HttpNotifier, TransferEngine};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn should_seed() -> bool {
    std::env::args().any(|a| a == "--seed")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    tracing::info!(
        env = %env,
        git = env!("GIT_HASH"),
        "Starting payflow"
    );

    let postgres_url = config
        .postgres_url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("postgres_url missing from config/{}.yaml", env))?;

    let db = Database::connect(&postgres_url).await?;
    schema::init(db.pool()).await?;

    if should_seed() {
        schema::seed_demo_users(db.pool()).await?;
    }

    let users = Arc::new(UserRepository::new(db.pool().clone()));
    let wallets = Arc::new(WalletRepository::new(db.pool().clone()));
    let transactions = Arc::new(TransactionRepository::new(db.pool().clone()));
    let authorizer = Arc::new(HttpAuthorizer::new(&config.authorization)?);
    let notifier = Arc::new(HttpNotifier::new(&config.notification)?);

    let engine = Arc::new(TransferEngine::new(
        db.clone(),
        users,
        wallets,
        transactions,
        authorizer,
        notifier,
    ));

    let gate = Arc::new(IdempotencyGate::new(
        Arc::new(InMemoryIdempotencyStore::new()),
        &config.idempotency,
    ));

    let state = Arc::new(AppState::new(engine, gate, db));

    gateway::serve(&config.gateway, state).await
}
