//! Fixed-point numeric types for prices and share quantities
//!
//! Uses rust_decimal for deterministic price arithmetic (no floating-point
//! errors). Prices on a binary market are probabilities: strictly between
//! 0 and 1 with at most 8 fractional digits. Share quantities are whole
//! integers. Notional values round half-to-even at the collateral scale.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Number of fractional digits carried by prices and collateral amounts.
pub const PRICE_SCALE: u32 = 8;

/// Price of one outcome share, strictly inside (0, 1).
///
/// Serialized as a string to prevent JSON number precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price from a Decimal.
    ///
    /// # Panics
    /// Panics if the value is outside (0, 1) exclusive.
    pub fn new(value: Decimal) -> Self {
        Self::try_new(value).expect("Price must be strictly between 0 and 1")
    }

    /// Try to create a Price, returning None when outside (0, 1) exclusive
    /// or carrying more than [`PRICE_SCALE`] fractional digits.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO && value < Decimal::ONE && value.scale() <= PRICE_SCALE {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Convert from a JSON-supplied float, rounded to [`PRICE_SCALE`].
    ///
    /// Returns None for non-finite inputs or values outside (0, 1).
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let decimal = Decimal::from_f64(value)?.round_dp(PRICE_SCALE);
        Self::try_new(decimal)
    }

    /// Create from string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Render with exactly [`PRICE_SCALE`] fractional digits ("0.55000000").
    ///
    /// Used for canonical receipt bytes and fixed-scale storage.
    pub fn fixed_scale(&self) -> String {
        let mut value = self.0;
        value.rescale(PRICE_SCALE);
        value.to_string()
    }
}

// Custom serialization to preserve precision
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal)
            .ok_or_else(|| serde::de::Error::custom("Price must be strictly between 0 and 1"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whole number of outcome shares.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Zero shares (initial filled quantity of a fresh order).
    pub fn zero() -> Self {
        Self(0)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Smaller of two quantities (fill sizing).
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Subtraction that refuses to go below zero.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(
            self.0 >= rhs.0,
            "Quantity subtraction would result in negative"
        );
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade notional: price × quantity, rounded half-to-even at the
/// collateral scale.
pub fn notional(price: Price, quantity: Quantity) -> Decimal {
    (price.as_decimal() * quantity.as_decimal())
        .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_str("0.55").unwrap();
        assert_eq!(price.as_decimal(), Decimal::from_str("0.55").unwrap());
    }

    #[test]
    #[should_panic(expected = "Price must be strictly between 0 and 1")]
    fn test_price_zero_panics() {
        Price::new(Decimal::ZERO);
    }

    #[test]
    #[should_panic(expected = "Price must be strictly between 0 and 1")]
    fn test_price_one_panics() {
        Price::new(Decimal::ONE);
    }

    #[test]
    fn test_price_bounds_exclusive() {
        assert!(Price::try_new(Decimal::from_str("0.00000001").unwrap()).is_some());
        assert!(Price::try_new(Decimal::from_str("0.99999999").unwrap()).is_some());
        assert!(Price::try_new(Decimal::ZERO).is_none());
        assert!(Price::try_new(Decimal::ONE).is_none());
        assert!(Price::try_new(Decimal::from_str("-0.5").unwrap()).is_none());
        assert!(Price::try_new(Decimal::from_str("1.5").unwrap()).is_none());
    }

    #[test]
    fn test_price_scale_limit() {
        // 9 fractional digits exceeds the price scale
        assert!(Price::try_new(Decimal::from_str("0.123456789").unwrap()).is_none());
        assert!(Price::try_new(Decimal::from_str("0.12345678").unwrap()).is_some());
    }

    #[test]
    fn test_price_from_f64() {
        assert_eq!(Price::from_f64(0.55).unwrap(), Price::from_str("0.55").unwrap());
        assert!(Price::from_f64(0.0).is_none());
        assert!(Price::from_f64(1.0).is_none());
        assert!(Price::from_f64(f64::NAN).is_none());
        assert!(Price::from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn test_price_fixed_scale() {
        assert_eq!(Price::from_str("0.55").unwrap().fixed_scale(), "0.55000000");
        assert_eq!(
            Price::from_str("0.12345678").unwrap().fixed_scale(),
            "0.12345678"
        );
    }

    #[test]
    fn test_price_serialization() {
        let price = Price::from_str("0.55").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"0.55\"");

        let deserialized: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, deserialized);
    }

    #[test]
    fn test_price_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Price>("\"1.5\"").is_err());
        assert!(serde_json::from_str::<Price>("\"0\"").is_err());
    }

    #[test]
    fn test_quantity_arithmetic() {
        let q1 = Quantity::new(100);
        let q2 = Quantity::new(40);

        assert_eq!(q1 + q2, Quantity::new(140));
        assert_eq!(q1 - q2, Quantity::new(60));
        assert_eq!(q1.min(q2), q2);
        assert_eq!(q2.checked_sub(q1), None);
    }

    #[test]
    #[should_panic(expected = "Quantity subtraction would result in negative")]
    fn test_quantity_underflow_panics() {
        let _ = Quantity::new(1) - Quantity::new(2);
    }

    #[test]
    fn test_notional() {
        let price = Price::from_str("0.55").unwrap();
        let qty = Quantity::new(100);
        assert_eq!(notional(price, qty), Decimal::from_str("55").unwrap());
    }

    #[test]
    fn test_notional_exact_at_scale() {
        // Integer quantities keep the product within the collateral scale,
        // so the half-to-even step only guards against scale drift.
        let value = notional(Price::from_str("0.00000005").unwrap(), Quantity::new(3));
        assert_eq!(value, Decimal::from_str("0.00000015").unwrap());
    }

    #[test]
    fn test_notional_deterministic() {
        let p = Price::from_str("0.12345678").unwrap();
        let q = Quantity::new(997);
        assert_eq!(notional(p, q), notional(p, q));
    }
}
