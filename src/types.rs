// 1.0: all the primitives live here. nothing in the engine works without these types.
// IDs, token amounts, USD values, health factors, timestamps. each is a newtype so the
// compiler catches type mixups.
//
// all quantities carry at most 18 fractional digits; constructors truncate toward zero
// past that, which is also the rounding rule for every multiply/divide in the crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

pub const VALUE_SCALE: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u32);

// 1.1: non-negative token quantity, in the token's own units. collateral balances,
// synthetic debt, transfer sizes all use this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value.trunc_with_scale(VALUE_SCALE)))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value >= Decimal::ZERO);
        Self(value.trunc_with_scale(VALUE_SCALE))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: Amount) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    // None when the subtrahend exceeds the balance. callers turn this into a
    // typed insufficient-funds error instead of wrapping.
    pub fn checked_sub(&self, other: Amount) -> Option<Self> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Self(result))
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, a| {
            acc.checked_add(a).unwrap_or(Self(Decimal::MAX))
        })
    }
}

// 1.2: USD value. the synthetic asset is pegged 1:1, so debt amounts convert to
// USD values without a price lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Usd(Decimal);

impl Usd {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value.trunc_with_scale(VALUE_SCALE)))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value >= Decimal::ZERO);
        Self(value.trunc_with_scale(VALUE_SCALE))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: Usd) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

// 1.3: threshold-adjusted collateral value over debt. >= 1 means solvent.
// a debt-free position has no constraint and reports the max sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HealthFactor(Decimal);

impl HealthFactor {
    pub const MAX: HealthFactor = HealthFactor(Decimal::MAX);

    pub fn new(value: Decimal) -> Self {
        Self(value.trunc_with_scale(VALUE_SCALE))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_max(&self) -> bool {
        self.0 == Decimal::MAX
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_max() {
            write!(f, "max")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// 1.4: millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        (self.0 / 1000).max(0) as u64
    }
}
