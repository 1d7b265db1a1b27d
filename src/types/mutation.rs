//! Book mutation records as delivered by the feed.
//!
//! Each display field is a [`FieldUpdate`]: either a fresh value or
//! `Unchanged`, in which case the previous snapshot's value is carried
//! forward (see [`OrderEntry::build`](crate::types::OrderEntry::build)).

use serde::{Deserialize, Serialize};

use crate::types::{OrderKey, Price, Side};

/// Per-field update tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    /// The feed supplied a new value
    Updated(T),
    /// Keep whatever the previous snapshot had
    #[default]
    Unchanged,
}

impl<T> FieldUpdate<T> {
    #[inline]
    pub fn is_updated(&self) -> bool {
        matches!(self, FieldUpdate::Updated(_))
    }

    /// The new value, if any
    #[inline]
    pub fn updated(&self) -> Option<&T> {
        match self {
            FieldUpdate::Updated(value) => Some(value),
            FieldUpdate::Unchanged => None,
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => FieldUpdate::Updated(value),
            None => FieldUpdate::Unchanged,
        }
    }
}

/// Numeric price plus its formatted display string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceField {
    pub value: Price,
    pub display: String,
}

/// What the feed wants done with an order key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    /// Initial image delivered right after subscribing
    Refresh,
    Add,
    Update,
    Remove,
}

impl MutationKind {
    /// `true` for kinds that insert or replace an order
    #[inline]
    pub fn is_upsert(self) -> bool {
        !matches!(self, MutationKind::Remove)
    }
}

/// One incremental book event.
///
/// Built with the `with_*` methods in tests and by the feed record codec in
/// production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMutation {
    pub order_key: OrderKey,
    pub kind: MutationKind,
    pub side: Option<Side>,
    pub price: FieldUpdate<PriceField>,
    pub size: FieldUpdate<String>,
    pub time: FieldUpdate<String>,
    pub date: FieldUpdate<String>,
    pub participant: FieldUpdate<String>,
    pub exchange: FieldUpdate<String>,
    pub order_id: FieldUpdate<String>,
}

impl BookMutation {
    /// Empty mutation of the given kind: every field unchanged
    pub fn new(order_key: impl Into<OrderKey>, kind: MutationKind) -> Self {
        Self {
            order_key: order_key.into(),
            kind,
            side: None,
            price: FieldUpdate::Unchanged,
            size: FieldUpdate::Unchanged,
            time: FieldUpdate::Unchanged,
            date: FieldUpdate::Unchanged,
            participant: FieldUpdate::Unchanged,
            exchange: FieldUpdate::Unchanged,
            order_id: FieldUpdate::Unchanged,
        }
    }

    pub fn add(order_key: impl Into<OrderKey>, side: Side) -> Self {
        Self::new(order_key, MutationKind::Add).with_side(side)
    }

    pub fn refresh(order_key: impl Into<OrderKey>, side: Side) -> Self {
        Self::new(order_key, MutationKind::Refresh).with_side(side)
    }

    pub fn update(order_key: impl Into<OrderKey>) -> Self {
        Self::new(order_key, MutationKind::Update)
    }

    pub fn remove(order_key: impl Into<OrderKey>) -> Self {
        Self::new(order_key, MutationKind::Remove)
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    /// Set the price, displayed exactly as the decimal prints
    pub fn with_price(self, price: Price) -> Self {
        let display = price.to_string();
        self.with_price_display(price, display)
    }

    pub fn with_price_display(mut self, price: Price, display: impl Into<String>) -> Self {
        self.price = FieldUpdate::Updated(PriceField {
            value: price,
            display: display.into(),
        });
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = FieldUpdate::Updated(size.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = FieldUpdate::Updated(time.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = FieldUpdate::Updated(date.into());
        self
    }

    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = FieldUpdate::Updated(participant.into());
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = FieldUpdate::Updated(exchange.into());
        self
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = FieldUpdate::Updated(order_id.into());
        self
    }

    /// Names of the fields a first-sight order needs but this mutation lacks.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.side.is_none() {
            missing.push("side");
        }
        if !self.price.is_updated() {
            missing.push("price");
        }
        if !self.size.is_updated() {
            missing.push("size");
        }
        if !self.time.is_updated() {
            missing.push("time");
        }
        if !self.date.is_updated() {
            missing.push("date");
        }
        if !self.participant.is_updated() {
            missing.push("participant");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_update_from_option() {
        assert_eq!(FieldUpdate::from(Some(3)), FieldUpdate::Updated(3));
        assert_eq!(FieldUpdate::<i32>::from(None), FieldUpdate::Unchanged);
        assert_eq!(FieldUpdate::Updated(3).updated(), Some(&3));
    }

    #[test]
    fn test_builders() {
        let m = BookMutation::add("A1", Side::Sell)
            .with_price(Price::from_scaled(1010, 2))
            .with_exchange("Q");

        assert_eq!(m.kind, MutationKind::Add);
        assert_eq!(m.side, Some(Side::Sell));
        assert_eq!(m.price.updated().map(|p| p.display.as_str()), Some("10.10"));
        assert_eq!(m.exchange, FieldUpdate::Updated("Q".to_string()));
        assert!(!m.size.is_updated());
    }

    #[test]
    fn test_missing_required_fields() {
        let m = BookMutation::update("A1");
        assert_eq!(
            m.missing_required_fields(),
            vec!["side", "price", "size", "time", "date", "participant"]
        );
    }

    #[test]
    fn test_kind_is_upsert() {
        assert!(MutationKind::Refresh.is_upsert());
        assert!(MutationKind::Update.is_upsert());
        assert!(!MutationKind::Remove.is_upsert());
    }
}
