//! Account Models
//!
//! Users (wallet owners) and their wallets. Users are read-only from the
//! transfer engine's perspective; wallets are mutated only through the
//! repository's debit/credit under a held row lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::money::Money;

/// Kind of wallet owner.
///
/// Merchants receive payments but may not initiate transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Common,
    Merchant,
}

impl UserKind {
    /// Whether this kind of owner may initiate a transfer.
    #[inline]
    pub fn can_transfer(&self) -> bool {
        matches!(self, UserKind::Common)
    }

    /// Text code for PostgreSQL storage
    pub fn as_str(&self) -> &'static str {
        match self {
            UserKind::Common => "common",
            UserKind::Merchant => "merchant",
        }
    }

    /// Convert from PostgreSQL text code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "common" => Some(UserKind::Common),
            "merchant" => Some(UserKind::Merchant),
            _ => None,
        }
    }
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserKind::from_code(s).ok_or(())
    }
}

/// Wallet owner identity
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub kind: UserKind,
    pub created_at: DateTime<Utc>,
}

/// Per-owner balance record (1:1 with users)
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Money,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_kind_roundtrip() {
        assert_eq!(UserKind::from_code("common"), Some(UserKind::Common));
        assert_eq!(UserKind::from_code("merchant"), Some(UserKind::Merchant));
        assert_eq!(UserKind::from_code("shopkeeper"), None);
        assert_eq!(UserKind::Common.as_str(), "common");
        assert_eq!(UserKind::Merchant.as_str(), "merchant");
    }

    #[test]
    fn transfer_capability() {
        assert!(UserKind::Common.can_transfer());
        assert!(!UserKind::Merchant.can_transfer());
    }
}
