//! Decimal price type used for level grouping and ordering.
//!
//! ## Overview
//!
//! Prices arrive from the feed as formatted strings. The numeric value is
//! parsed once into a [`Price`], which wraps `rust_decimal::Decimal` so that
//! level keys are exact: `10.1` never collides with `10.100000000000001`
//! the way a binary float would.
//!
//! ## Equality
//!
//! Comparison and hashing are by numeric value, so `"10.0"` and `"10.00"`
//! land on the same price level. The scale of the parsed string is kept for
//! `Display`.
//!
//! ## Examples
//!
//! ```
//! use orderbook_viewer::types::Price;
//!
//! let a: Price = "10.0".parse().unwrap();
//! let b: Price = "10.00".parse().unwrap();
//! assert_eq!(a, b);
//! assert_eq!(b.to_string(), "10.00");
//! ```

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a price string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid price {value:?}: {reason}")]
pub struct PriceError {
    /// The rejected input
    pub value: String,
    /// Parser message
    pub reason: String,
}

/// Exact decimal price.
///
/// No range or sign validation is performed: the book groups and orders
/// whatever the feed sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero price
    pub const ZERO: Price = Price(Decimal::ZERO);

    /// Wrap a decimal value
    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Build a price from an integer mantissa and a decimal scale.
    ///
    /// # Panics
    ///
    /// If `scale` exceeds 28, the largest scale `Decimal` supports. Feed
    /// prices go through [`FromStr`], which reports that case as a
    /// [`PriceError`] instead.
    ///
    /// ```
    /// use orderbook_viewer::types::Price;
    ///
    /// assert_eq!(Price::from_scaled(1005, 2).to_string(), "10.05");
    /// ```
    #[inline]
    pub fn from_scaled(mantissa: i64, scale: u32) -> Self {
        Self(Decimal::new(mantissa, scale))
    }

    /// The underlying decimal
    #[inline]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Canonical text form with trailing zeros stripped.
    ///
    /// Two equal prices always produce the same canonical string, which makes
    /// this suitable for hashing.
    pub fn canonical(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Price)
            .map_err(|e| PriceError {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
