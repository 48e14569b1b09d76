//! HTTP Gateway
//!
//! Thin axum surface over the transfer engine. Routing and schema decoding
//! live here; all domain decisions belong to the engine and the idempotency
//! gate.

pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
pub use state::AppState;

/// Build the gateway router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/transfer", post(handlers::create_transfer))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Bind and serve until the process exits
pub async fn serve(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Gateway listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
