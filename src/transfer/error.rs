//! Transfer Error Types
//!
//! Every failure a transfer can surface, with a stable machine code and HTTP
//! status mapping for the gateway.

use thiserror::Error;
use uuid::Uuid;

use crate::account::StoreError;

/// Transfer error taxonomy
#[derive(Debug, Error, Clone)]
pub enum TransferError {
    // === Validation errors ===
    #[error("Payer and payee cannot be the same user")]
    SelfTransfer,

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Merchant accounts cannot initiate transfers")]
    MerchantPayer,

    // === Lookup errors ===
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Wallet not found for user: {0}")]
    WalletNotFound(Uuid),

    // === Domain errors ===
    #[error("Insufficient balance")]
    InsufficientBalance,

    // === Authorization errors ===
    #[error("Transfer not authorized by external service")]
    Unauthorized,

    #[error("Authorization service unavailable: {0}")]
    AuthorizationUnavailable(String),

    // === Request-boundary errors ===
    #[error("Another request with the same idempotency key is in flight")]
    IdempotencyConflict,

    // === System errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Stable machine-readable code for API responses and logs
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::SelfTransfer => "SELF_TRANSFER",
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::MerchantPayer => "MERCHANT_PAYER",
            TransferError::UserNotFound(_) => "USER_NOT_FOUND",
            TransferError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            TransferError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransferError::Unauthorized => "UNAUTHORIZED",
            TransferError::AuthorizationUnavailable(_) => "AUTHORIZATION_UNAVAILABLE",
            TransferError::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            TransferError::Database(_) => "DATABASE_ERROR",
            TransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Fixed HTTP status mapping
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::SelfTransfer | TransferError::InvalidAmount => 422,
            TransferError::MerchantPayer | TransferError::Unauthorized => 403,
            TransferError::UserNotFound(_) | TransferError::WalletNotFound(_) => 404,
            TransferError::InsufficientBalance => 400,
            TransferError::AuthorizationUnavailable(_) => 502,
            TransferError::IdempotencyConflict => 429,
            TransferError::Database(_) | TransferError::Internal(_) => 500,
        }
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        TransferError::Database(e.to_string())
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::WalletNotFound(id) => TransferError::WalletNotFound(id),
            StoreError::Database(e) => TransferError::Database(e.to_string()),
            StoreError::CorruptBalance(e) => TransferError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TransferError::SelfTransfer.code(), "SELF_TRANSFER");
        assert_eq!(
            TransferError::InsufficientBalance.code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(TransferError::MerchantPayer.code(), "MERCHANT_PAYER");
        assert_eq!(TransferError::Unauthorized.code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TransferError::SelfTransfer.http_status(), 422);
        assert_eq!(TransferError::InvalidAmount.http_status(), 422);
        assert_eq!(TransferError::MerchantPayer.http_status(), 403);
        assert_eq!(TransferError::Unauthorized.http_status(), 403);
        assert_eq!(TransferError::UserNotFound(Uuid::nil()).http_status(), 404);
        assert_eq!(TransferError::InsufficientBalance.http_status(), 400);
        assert_eq!(
            TransferError::AuthorizationUnavailable("down".into()).http_status(),
            502
        );
        assert_eq!(TransferError::IdempotencyConflict.http_status(), 429);
        assert_eq!(TransferError::Database("boom".into()).http_status(), 500);
    }

    #[test]
    fn test_store_error_conversion() {
        let id = Uuid::new_v4();
        let e: TransferError = StoreError::WalletNotFound(id).into();
        assert!(matches!(e, TransferError::WalletNotFound(got) if got == id));
    }
}
