use crate::error::{Result, SettlementError};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

/// Number of decimal places used when a figure is presented.
pub const PRESENTATION_DP: u32 = 2;

/// An exact monetary value.
///
/// Wraps `rust_decimal::Decimal` so that every figure flowing through the
/// settlement pipeline is base-10 and never binary floating point. Values
/// keep their full scale internally; rounding happens only in [`Money::rounded`]
/// and in the `Display` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Rounds to cents using banker's rounding, the way a ledger prints it.
    pub fn rounded(&self) -> Decimal {
        let mut rounded = self
            .0
            .round_dp_with_strategy(PRESENTATION_DP, RoundingStrategy::MidpointNearestEven);
        rounded.rescale(PRESENTATION_DP);
        rounded
    }

    /// `self + rhs`, or a validation error when the sum leaves the `Decimal` range.
    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| out_of_range(self, "+", rhs.0))
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or_else(|| out_of_range(self, "-", rhs.0))
    }

    pub fn checked_mul(self, factor: Decimal) -> Result<Self> {
        self.0
            .checked_mul(factor)
            .map(Self)
            .ok_or_else(|| out_of_range(self, "*", factor))
    }
}

fn out_of_range(lhs: Money, op: &str, rhs: Decimal) -> SettlementError {
    SettlementError::Validation(format!("amount out of range: {} {op} {rhs}", lhs.0))
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-${}", rounded.abs())
        } else {
            write!(f, "${}", rounded.abs())
        }
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Coerces a loosely typed stored value into an exact decimal.
///
/// This is the single ingestion boundary for monetary fields. Integers and
/// already-exact decimal strings parse directly. Floats are stringified first
/// (shortest round-trip form) so `0.1` becomes exactly `0.1` instead of the
/// nearest binary fraction. `null` and the empty string count as a missing
/// optional field and default to zero.
pub fn coerce_decimal(field: &str, value: &Value) -> Result<Money> {
    match value {
        Value::Null => Ok(Money::ZERO),
        Value::Number(n) => parse_decimal(field, &n.to_string()),
        Value::String(s) if s.trim().is_empty() => Ok(Money::ZERO),
        Value::String(s) => parse_decimal(field, s.trim()),
        other => Err(SettlementError::Validation(format!(
            "{field} must be a monetary value, got {other}"
        ))),
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Money> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map(Money)
        .map_err(|e| SettlementError::Validation(format!("{field}: invalid amount {raw:?} ({e})")))
}
