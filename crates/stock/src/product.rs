//! Product records and the value objects they are built from.

use core::borrow::Borrow;

use serde::{Deserialize, Serialize};

use estoque_core::{Entity, ValueObject};

/// Product name: the natural key of a record within the stock.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductName(String);

impl ProductName {
    /// Returns `None` when the name is empty or whitespace-only.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProductName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProductName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monetary amount in the smallest currency unit (cents). No currency code.
///
/// Signed so that invalid (negative) prices can be represented and rejected
/// by validation rather than by the type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a decimal amount (e.g. `100.00`) rounding to the nearest cent.
    ///
    /// Out-of-range amounts saturate; NaN becomes zero. Use
    /// [`Money::try_from_major`] for untrusted input.
    pub fn from_major(amount: f64) -> Self {
        Self((amount * 100.0).round() as i64)
    }

    /// Like [`Money::from_major`], but `None` for NaN, infinities, and amounts
    /// whose cent value does not fit in an `i64`.
    pub fn try_from_major(amount: f64) -> Option<Self> {
        let cents = (amount * 100.0).round();
        // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
        if !cents.is_finite() || cents >= i64::MAX as f64 || cents < i64::MIN as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `self * quantity`, saturating at the `i64` bounds.
    pub fn times(self, quantity: i64) -> Money {
        Money(self.0.saturating_mul(quantity))
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Input shape of `Stock::add`. Nothing here is validated yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
        }
    }
}

/// A product held by the stock. Always has `quantity > 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub(crate) name: ProductName,
    pub(crate) quantity: i64,
    pub(crate) unit_price: Money,
}

impl ProductRecord {
    pub fn name(&self) -> &ProductName {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn total_value(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            name: self.name.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_value: self.total_value(),
        }
    }
}

impl Entity for ProductRecord {
    type Id = ProductName;

    fn id(&self) -> &Self::Id {
        &self.name
    }
}

/// Read model returned by `query` and `list`.
///
/// `total_value` is computed when the snapshot is taken and always equals
/// `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: ProductName,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_value: Money,
}
