//! Money Value Type
//!
//! Fixed-precision decimal amounts with exactly two fractional digits.
//! All wallet balances and transfer amounts MUST go through this type.
//!
//! ## Design Principles
//! 1. Never a float: amounts are exact decimals end to end
//! 2. Non-negative by construction: a `Money` can never hold a negative value
//! 3. Deterministic rounding: inputs beyond 2 decimals round half-away-from-zero
//!
//! ## Usage
//! ```rust
//! use payflow::money::Money;
//!
//! let balance = Money::parse("100.00").unwrap();
//! let amount = Money::parse("50").unwrap();
//! let rest = balance.subtract(&amount).unwrap();
//! assert_eq!(rest.to_string(), "50.00");
//! ```

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fractional digits carried by every amount
pub const SCALE: u32 = 2;

/// Money construction and arithmetic errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Subtraction result would be negative")]
    NegativeResult,
}

/// A non-negative monetary amount at fixed 2-decimal scale.
///
/// Stored as a [`Decimal`] rescaled to exactly [`SCALE`] digits, so equality,
/// ordering, and string round-trips are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Parse a client-facing amount string.
    ///
    /// Rejects non-numeric and negative input. Values with more than two
    /// fractional digits are rounded half-away-from-zero to the fixed scale.
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(MoneyError::InvalidAmount("empty string".into()));
        }

        let value =
            Decimal::from_str(input).map_err(|_| MoneyError::InvalidAmount(input.to_string()))?;

        Self::from_decimal(value)
    }

    /// Construct from an exact decimal (JSON boundary, DB rows).
    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        if value.is_zero() {
            // Canonical zero, drops any negative-zero sign flag
            let mut zero = Decimal::ZERO;
            zero.rescale(SCALE);
            return Ok(Money(zero));
        }
        if value.is_sign_negative() {
            return Err(MoneyError::NegativeAmount);
        }

        let mut scaled =
            value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        scaled.rescale(SCALE);
        Ok(Money(scaled))
    }

    /// The inner decimal, for sqlx binds.
    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Addition is total: two in-range amounts cannot overflow a `Decimal`
    /// at this scale.
    pub fn add(&self, other: &Money) -> Money {
        let mut sum = self.0 + other.0;
        sum.rescale(SCALE);
        Money(sum)
    }

    /// Checked subtraction. Fails with [`MoneyError::NegativeResult`] when the
    /// result would drop below zero; this is bare arithmetic, distinct from the
    /// domain-level insufficient-balance check the engine performs.
    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        let mut diff = self.0 - other.0;
        if diff.is_sign_negative() && !diff.is_zero() {
            return Err(MoneyError::NegativeResult);
        }
        diff.rescale(SCALE);
        Ok(Money(diff))
    }

    #[inline]
    pub fn is_gte(&self, other: &Money) -> bool {
        self.0 >= other.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Rescaled on construction, so this always renders 2 decimals
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::from_decimal(value)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Serialize as string to preserve precision
        serializer.serialize_str(&self.0.to_string())
    }
}
