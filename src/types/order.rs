//! Order identity and the immutable per-order display snapshot.
//!
//! ## Carry-Forward
//!
//! Feed updates are partial: each field is tagged as updated or not. An
//! [`OrderEntry`] is rebuilt on every add/update by merging the incoming
//! [`BookMutation`] onto the previous snapshot for the same key:
//!
//! - updated field: take the new value
//! - unchanged field with a previous snapshot: carry the old value forward
//! - unchanged field without a previous snapshot: blank (or a
//!   [`BookError::MalformedOrder`] for required fields)
//!
//! Construction is pure. The same mutation and previous snapshot always
//! produce an identical entry.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BookError;
use crate::types::mutation::{BookMutation, FieldUpdate};
use crate::types::Price;

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy (bid) or Sell (ask)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bid side, best price is the highest
    #[default]
    #[serde(alias = "B", alias = "bid")]
    Buy,
    /// Ask side, best price is the lowest
    #[serde(alias = "S", alias = "ask")]
    Sell,
}

impl Side {
    /// Both sides, bids first
    pub const BOTH: [Side; 2] = [Side::Buy, Side::Sell];

    /// Returns the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// `true` for the bid side
    #[inline]
    pub fn is_buy(self) -> bool {
        matches!(self, Side::Buy)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("bid"),
            Side::Sell => f.write_str("ask"),
        }
    }
}

// ============================================================================
// OrderKey
// ============================================================================

/// Unique, stable identifier of a resting order as assigned by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderKey(String);

impl OrderKey {
    /// Wrap a feed key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if the feed sent no identifier
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<str> for OrderKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for OrderKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// OrderIdMode
// ============================================================================

/// How the displayed order id is produced.
///
/// Only affects [`OrderEntry::order_id`], never book ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderIdMode {
    /// Show the raw feed key
    #[default]
    Key,
    /// Show the decoded order-id field carried on the mutation
    Field,
}

// ============================================================================
// OrderEntry
// ============================================================================

/// Immutable snapshot of one resting order's display-relevant fields.
///
/// A new snapshot replaces the old one on every update; fields are never
/// blanked while the order rests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    order_key: OrderKey,
    side: Side,
    price: Price,
    display_price: String,
    display_size: String,
    display_time: String,
    display_date: String,
    participant: String,
    exchange: String,
    order_id: String,
}

impl OrderEntry {
    /// Build a snapshot by merging `mutation` onto `previous`.
    ///
    /// # Errors
    ///
    /// [`BookError::MalformedOrder`] if there is no previous snapshot and any
    /// of side, price, size, time, date or participant is not supplied.
    ///
    /// # Example
    ///
    /// ```
    /// use orderbook_viewer::types::{BookMutation, OrderEntry, OrderIdMode, Price, Side};
    ///
    /// let add = BookMutation::add("A1", Side::Buy)
    ///     .with_price(Price::from_scaled(1000, 2))
    ///     .with_size("100")
    ///     .with_time("09:30:00")
    ///     .with_date("2024-01-02")
    ///     .with_participant("NSDQ");
    /// let first = OrderEntry::build(&add, None, OrderIdMode::Key).unwrap();
    ///
    /// let resize = BookMutation::update("A1").with_size("120");
    /// let second = OrderEntry::build(&resize, Some(&first), OrderIdMode::Key).unwrap();
    ///
    /// assert_eq!(second.display_size(), "120");
    /// assert_eq!(second.display_price(), "10.00");
    /// assert_eq!(second.participant(), "NSDQ");
    /// ```
    pub fn build(
        mutation: &BookMutation,
        previous: Option<&OrderEntry>,
        mode: OrderIdMode,
    ) -> Result<Self, BookError> {
        if previous.is_none() {
            let missing = mutation.missing_required_fields();
            if !missing.is_empty() {
                return Err(BookError::MalformedOrder {
                    key: mutation.order_key.clone(),
                    missing,
                });
            }
        }

        let side = match (mutation.side, previous) {
            (Some(side), _) => side,
            (None, Some(prev)) => prev.side,
            (None, None) => return Err(malformed(mutation, "side")),
        };

        let (price, display_price) = match (&mutation.price, previous) {
            (FieldUpdate::Updated(field), _) => (field.value, field.display.clone()),
            (FieldUpdate::Unchanged, Some(prev)) => (prev.price, prev.display_price.clone()),
            (FieldUpdate::Unchanged, None) => return Err(malformed(mutation, "price")),
        };

        let order_id = match mode {
            OrderIdMode::Key => mutation.order_key.to_string(),
            OrderIdMode::Field => carry(&mutation.order_id, previous.map(|p| p.order_id.as_str())),
        };

        Ok(Self {
            order_key: mutation.order_key.clone(),
            side,
            price,
            display_price,
            display_size: carry(&mutation.size, previous.map(|p| p.display_size.as_str())),
            display_time: carry(&mutation.time, previous.map(|p| p.display_time.as_str())),
            display_date: carry(&mutation.date, previous.map(|p| p.display_date.as_str())),
            participant: carry(&mutation.participant, previous.map(|p| p.participant.as_str())),
            exchange: carry(&mutation.exchange, previous.map(|p| p.exchange.as_str())),
            order_id,
        })
    }

    /// Feed key of this order
    #[inline]
    pub fn order_key(&self) -> &OrderKey {
        &self.order_key
    }

    /// Side the order rests on
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// `true` for bids
    #[inline]
    pub fn is_buy(&self) -> bool {
        self.side.is_buy()
    }

    /// Numeric price used for level grouping
    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    pub fn display_price(&self) -> &str {
        &self.display_price
    }

    pub fn display_size(&self) -> &str {
        &self.display_size
    }

    pub fn display_time(&self) -> &str {
        &self.display_time
    }

    pub fn display_date(&self) -> &str {
        &self.display_date
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Displayed order id, per [`OrderIdMode`]
    pub fn order_id(&self) -> &str {
        &self.order_id
    }
}

/// Take the updated value, else the previous one, else blank.
fn carry(update: &FieldUpdate<String>, previous: Option<&str>) -> String {
    match (update, previous) {
        (FieldUpdate::Updated(value), _) => value.clone(),
        (FieldUpdate::Unchanged, Some(prev)) => prev.to_string(),
        (FieldUpdate::Unchanged, None) => String::new(),
    }
}

fn malformed(mutation: &BookMutation, field: &'static str) -> BookError {
    BookError::MalformedOrder {
        key: mutation.order_key.clone(),
        missing: vec![field],
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn full_add(key: &str, side: Side, price: &str) -> BookMutation {
        BookMutation::add(key, side)
            .with_price(price.parse().unwrap())
            .with_size("100")
            .with_time("09:30:00")
            .with_date("2024-01-02")
            .with_participant("NSDQ")
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
        assert!(Side::Buy.is_buy());
        assert!(!Side::Sell.is_buy());
    }

    #[test]
    fn test_order_key_borrow() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(OrderKey::from("A1"), 7usize);
        assert_eq!(map.get("A1"), Some(&7));
    }

    #[test]
    fn test_build_first_sight() {
        let entry = OrderEntry::build(&full_add("A1", Side::Buy, "10.00"), None, OrderIdMode::Key).unwrap();

        assert_eq!(entry.order_key().as_str(), "A1");
        assert_eq!(entry.side(), Side::Buy);
        assert_eq!(entry.price(), Price::from_scaled(1000, 2));
        assert_eq!(entry.display_price(), "10.00");
        assert_eq!(entry.display_size(), "100");
        assert_eq!(entry.display_time(), "09:30:00");
        assert_eq!(entry.display_date(), "2024-01-02");
        assert_eq!(entry.participant(), "NSDQ");
        assert_eq!(entry.exchange(), "");
        assert_eq!(entry.order_id(), "A1");
    }

    #[test]
    fn test_build_missing_required_fields() {
        let partial = BookMutation::add("A1", Side::Buy).with_size("100");
        let err = OrderEntry::build(&partial, None, OrderIdMode::Key).unwrap_err();

        match err {
            BookError::MalformedOrder { key, missing } => {
                assert_eq!(key.as_str(), "A1");
                assert_eq!(missing, vec!["price", "time", "date", "participant"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_build_missing_side_on_first_sight() {
        let mut mutation = full_add("A1", Side::Buy, "10.00");
        mutation.side = None;
        let err = OrderEntry::build(&mutation, None, OrderIdMode::Key).unwrap_err();
        assert!(matches!(err, BookError::MalformedOrder { .. }));
    }

    #[test]
    fn test_carry_forward_partial_update() {
        let first = OrderEntry::build(&full_add("A1", Side::Buy, "10.00"), None, OrderIdMode::Key).unwrap();
        let update = BookMutation::update("A1").with_size("120");
        let second = OrderEntry::build(&update, Some(&first), OrderIdMode::Key).unwrap();

        assert_eq!(second.display_size(), "120");
        assert_eq!(second.price(), first.price());
        assert_eq!(second.display_price(), first.display_price());
        assert_eq!(second.display_time(), first.display_time());
        assert_eq!(second.participant(), first.participant());
        assert_eq!(second.side(), Side::Buy);
    }

    #[test]
    fn test_carry_forward_idempotent() {
        let first = OrderEntry::build(&full_add("A1", Side::Sell, "10.10"), None, OrderIdMode::Key).unwrap();
        let noop = BookMutation::update("A1");
        let second = OrderEntry::build(&noop, Some(&first), OrderIdMode::Key).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_is_deterministic() {
        let mutation = full_add("A1", Side::Buy, "10.00");
        let a = OrderEntry::build(&mutation, None, OrderIdMode::Key).unwrap();
        let b = OrderEntry::build(&mutation, None, OrderIdMode::Key).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_price_update_changes_numeric_and_display() {
        let first = OrderEntry::build(&full_add("A1", Side::Buy, "10.00"), None, OrderIdMode::Key).unwrap();
        let update = BookMutation::update("A1").with_price_display(Price::from_scaled(1005, 2), "10.05 USD");
        let second = OrderEntry::build(&update, Some(&first), OrderIdMode::Key).unwrap();

        assert_eq!(second.price(), Price::from_scaled(1005, 2));
        assert_eq!(second.display_price(), "10.05 USD");
    }

    #[test]
    fn test_order_id_field_mode() {
        let add = full_add("K-1", Side::Buy, "10.00").with_order_id("ABC123");
        let first = OrderEntry::build(&add, None, OrderIdMode::Field).unwrap();
        assert_eq!(first.order_id(), "ABC123");

        // Carried forward when not resent
        let update = BookMutation::update("K-1").with_size("5");
        let second = OrderEntry::build(&update, Some(&first), OrderIdMode::Field).unwrap();
        assert_eq!(second.order_id(), "ABC123");

        // Key mode ignores the field
        let keyed = OrderEntry::build(&add, None, OrderIdMode::Key).unwrap();
        assert_eq!(keyed.order_id(), "K-1");
    }

    #[test]
    fn test_optional_fields_default_blank() {
        let entry = OrderEntry::build(&full_add("A1", Side::Buy, "1"), None, OrderIdMode::Field).unwrap();
        assert_eq!(entry.exchange(), "");
        assert_eq!(entry.order_id(), "");
    }
}
