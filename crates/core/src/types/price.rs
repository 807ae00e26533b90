//! Type-safe product price using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative product price in the shop's local currency.
///
/// Serialized as a plain JSON number (`40`, `12.5`) so the browser client can
/// send `Number(form.productPrice)` unchanged. Deserialization does not run
/// the sign check; call [`Price::new`] or [`Price::validate`] on untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Re-check an already constructed price (e.g. one that came in through serde).
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn validate(self) -> Result<Self, PriceError> {
        Self::new(self.0)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 0)), Err(PriceError::Negative));
    }

    #[test]
    fn test_new_accepts_zero() {
        assert!(Price::new(Decimal::ZERO).is_ok());
        // -0 is still zero
        assert!(Price::new(-Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_deserializes_json_integer_and_float() {
        let whole: Price = serde_json::from_str("40").unwrap();
        assert_eq!(whole.amount(), Decimal::new(40, 0));

        let fractional: Price = serde_json::from_str("12.5").unwrap();
        assert_eq!(fractional.amount(), Decimal::new(125, 1));
    }

    #[test]
    fn test_serializes_as_number() {
        let price = Price::new(Decimal::new(40, 0)).unwrap();
        let json = serde_json::to_value(price).unwrap();
        assert!(json.is_number());
        assert!((json.as_f64().unwrap() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_catches_deserialized_negative() {
        let price: Price = serde_json::from_str("-3").unwrap();
        assert!(price.validate().is_err());
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Price::new(Decimal::new(125, 1)).unwrap();
        assert_eq!(price.to_string(), "12.50");
    }
}
