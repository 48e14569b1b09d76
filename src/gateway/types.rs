//! Request/response types and the fixed error -> status mapping

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::idempotency::StoredResponse;
use crate::transfer::TransferError;

/// `POST /transfer` request body.
///
/// `value` accepts a JSON number or string; it is converted to [`Money`]
/// (2-decimal, non-negative) before reaching the engine.
///
/// [`Money`]: crate::money::Money
#[derive(Debug, Clone, Deserialize)]
pub struct TransferBody {
    pub payer: Uuid,
    pub payee: Uuid,
    pub value: Decimal,
}

/// Error body rendered for every non-2xx response
pub fn error_payload(e: &TransferError) -> StoredResponse {
    StoredResponse::new(
        e.http_status(),
        json!({
            "error": e.code(),
            "message": e.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn body_accepts_numeric_and_string_values() {
        let body: TransferBody = serde_json::from_str(
            r#"{"payer": "00000000-0000-0000-0000-000000000001",
                "payee": "00000000-0000-0000-0000-000000000002",
                "value": 50.25}"#,
        )
        .unwrap();
        assert_eq!(body.value, Decimal::from_str("50.25").unwrap());

        let body: TransferBody = serde_json::from_str(
            r#"{"payer": "00000000-0000-0000-0000-000000000001",
                "payee": "00000000-0000-0000-0000-000000000002",
                "value": "50.25"}"#,
        )
        .unwrap();
        assert_eq!(body.value, Decimal::from_str("50.25").unwrap());
    }

    #[test]
    fn body_rejects_malformed_uuid() {
        let result: Result<TransferBody, _> = serde_json::from_str(
            r#"{"payer": "not-a-uuid", "payee": "also-not", "value": 1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn error_payload_carries_code_and_status() {
        let payload = error_payload(&TransferError::InsufficientBalance);
        assert_eq!(payload.status, 400);
        assert_eq!(payload.body["error"], "INSUFFICIENT_BALANCE");

        let payload = error_payload(&TransferError::MerchantPayer);
        assert_eq!(payload.status, 403);

        let payload = error_payload(&TransferError::IdempotencyConflict);
        assert_eq!(payload.status, 429);

        let payload = error_payload(&TransferError::AuthorizationUnavailable("down".into()));
        assert_eq!(payload.status, 502);
    }
}
