//! HTTP handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::error;

use super::state::AppState;
use super::types::{TransferBody, error_payload};
use crate::idempotency::{GateOutcome, StoredResponse};
use crate::money::Money;
use crate::transfer::{TransferEngine, TransferError, TransferOrder};

/// Create transfer endpoint
///
/// POST /transfer
///
/// Optional `Idempotency-Key` header routes the request through the
/// idempotency gate; without it every request is processed.
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TransferBody>,
) -> Response {
    let key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let engine = state.engine.clone();
    let outcome = state
        .gate
        .execute(key.as_deref(), || process(engine, body))
        .await;

    match outcome {
        GateOutcome::Fresh(response) | GateOutcome::Replayed(response) => to_response(response),
        GateOutcome::InFlight => to_response(error_payload(&TransferError::IdempotencyConflict)),
    }
}

/// Health probe
///
/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"status": "degraded", "message": e.to_string()})),
        )
            .into_response(),
    }
}

/// Run one transfer and render the result as a cacheable response
async fn process(engine: Arc<TransferEngine>, body: TransferBody) -> StoredResponse {
    let amount = match Money::try_from(body.value) {
        Ok(amount) => amount,
        Err(e) => {
            return StoredResponse::new(
                422,
                serde_json::json!({"error": "INVALID_AMOUNT", "message": e.to_string()}),
            );
        }
    };

    match engine
        .execute(TransferOrder::new(body.payer, body.payee, amount))
        .await
    {
        Ok(transaction) => match serde_json::to_value(&transaction) {
            Ok(json) => StoredResponse::new(201, json),
            Err(e) => {
                error!(transaction_id = %transaction.id, error = %e, "Failed to serialize transaction");
                error_payload(&TransferError::Internal("response serialization".to_string()))
            }
        },
        Err(e) => {
            if e.http_status() >= 500 {
                // Full context in the log, generic message to the caller
                error!(
                    payer = %body.payer,
                    payee = %body.payee,
                    code = e.code(),
                    error = %e,
                    "Transfer failed"
                );
                let message = match &e {
                    TransferError::AuthorizationUnavailable(_) => {
                        "Authorization service unavailable"
                    }
                    _ => "Internal server error",
                };
                StoredResponse::new(
                    e.http_status(),
                    serde_json::json!({"error": e.code(), "message": message}),
                )
            } else {
                error_payload(&e)
            }
        }
    }
}

fn to_response(response: StoredResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}
