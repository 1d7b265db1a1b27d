//! Order-by-order book for a single instrument.
//!
//! ## Architecture
//!
//! - **Slab**: owns every [`OrderEntry`] (via [`OrderNode`]), O(1) insert/remove
//! - **HashMap**: order key -> slab key, uniqueness across both sides
//! - **PriceLevelIndex** x2: sorted price levels holding slab keys only
//!
//! ## Mutations
//!
//! | Kind | Key resting | Effect |
//! |------|-------------|--------|
//! | Refresh/Add/Update | no  | build entry, queue at tail of its price |
//! | Refresh/Add/Update | yes | build merged entry, unlink old, queue at tail of new price |
//! | Remove | yes | unlink and drop |
//! | Remove | no  | [`BookError::UnknownKeyOnRemove`], book untouched |
//!
//! The merged entry is built before anything is unlinked, so a rejected
//! event never changes the book.
//!
//! ## Example
//!
//! ```
//! use orderbook_viewer::orderbook::OrderBook;
//! use orderbook_viewer::types::{BookMutation, Price, Side};
//!
//! let mut book = OrderBook::with_window(50);
//! let add = BookMutation::add("A1", Side::Buy)
//!     .with_price(Price::from_scaled(1000, 2))
//!     .with_size("100")
//!     .with_time("09:30:00")
//!     .with_date("2024-01-02")
//!     .with_participant("NSDQ");
//!
//! let applied = book.apply(&add).unwrap();
//! assert_eq!(applied.rank, Some(0));
//! assert_eq!(book.best_bid(), Some(Price::from_scaled(1000, 2)));
//! ```

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};
use slab::Slab;
use tracing::error;

use crate::config::BookConfig;
use crate::display::DisplayProjector;
use crate::error::BookError;
use crate::orderbook::{OrderNode, PriceLevelIndex};
use crate::types::{BookMutation, OrderEntry, OrderIdMode, OrderKey, Price, Side};

/// What an applied mutation did to the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// First sight of the key
    Inserted,
    /// Existing key re-queued with a merged snapshot
    Replaced,
    /// Key left the book
    Removed,
}

/// Where an order sat before a mutation touched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub side: Side,
    /// Display rank, `None` if it was outside the window
    pub rank: Option<usize>,
}

/// Result of [`OrderBook::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub order_key: OrderKey,
    pub change: Change,
    /// Side the order rests on now (or rested on, for removals)
    pub side: Side,
    /// Current display rank; `None` after removal or outside the window
    pub rank: Option<usize>,
    /// Placement before this mutation, for replacements and removals
    pub previous: Option<Placement>,
}

impl Applied {
    /// First display row on `side` this mutation may have changed.
    pub fn first_dirty_row(&self, side: Side) -> Option<usize> {
        let current = if self.side == side { self.rank } else { None };
        let before = self.previous.filter(|p| p.side == side).and_then(|p| p.rank);
        match (current, before) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// First display row (either side) that needs repainting, if any.
    pub fn display_row(&self) -> Option<usize> {
        match (self.first_dirty_row(Side::Buy), self.first_dirty_row(Side::Sell)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Order book with a global key map and one price index per side.
#[derive(Debug)]
pub struct OrderBook {
    /// Arena owning every resting order
    orders: Slab<OrderNode>,

    /// Order key -> slab key
    index: HashMap<OrderKey, usize>,

    /// Bid levels (best = highest)
    bids: PriceLevelIndex,

    /// Ask levels (best = lowest)
    asks: PriceLevelIndex,

    /// Maximum displayed rows per side
    window_size: usize,

    order_id_mode: OrderIdMode,

    /// Set on the first invariant violation
    poisoned: bool,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new(&BookConfig::default())
    }
}

impl OrderBook {
    /// Create an empty book from a configuration.
    ///
    /// # Panics
    ///
    /// In debug builds, if `config.window_size` is 0. Use
    /// [`BookConfig::validate`] to reject such configs up front.
    pub fn new(config: &BookConfig) -> Self {
        debug_assert!(config.window_size > 0, "window size must be at least 1");
        Self {
            orders: Slab::with_capacity(config.initial_capacity),
            index: HashMap::with_capacity(config.initial_capacity),
            bids: PriceLevelIndex::new(Side::Buy),
            asks: PriceLevelIndex::new(Side::Sell),
            window_size: config.window_size,
            order_id_mode: config.order_id_mode,
            poisoned: false,
        }
    }

    /// Create an empty book with default settings and the given window.
    ///
    /// `window_size` must be at least 1 (checked in debug builds).
    pub fn with_window(window_size: usize) -> Self {
        Self::new(&BookConfig::default().with_window_size(window_size))
    }

    // ========================================================================
    // Capacity and Size
    // ========================================================================

    #[inline]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    #[inline]
    pub fn order_id_mode(&self) -> OrderIdMode {
        self.order_id_mode
    }

    /// Total resting orders across both sides
    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    #[inline]
    pub fn bid_count(&self) -> usize {
        self.bids.order_count()
    }

    #[inline]
    pub fn ask_count(&self) -> usize {
        self.asks.order_count()
    }

    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Apply one feed event.
    ///
    /// On success the returned [`Applied`] carries the order's display rank
    /// so the caller can decide whether the window needs repainting.
    ///
    /// # Errors
    ///
    /// - [`BookError::MissingOrderKey`] for an empty key
    /// - [`BookError::MalformedOrder`] when a first-sight order lacks required fields
    /// - [`BookError::UnknownKeyOnRemove`] for a late or duplicate remove
    /// - [`BookError::InvariantViolation`] if the indices disagree; the book is
    ///   poisoned and every later call returns [`BookError::Poisoned`]
    pub fn apply(&mut self, mutation: &BookMutation) -> Result<Applied, BookError> {
        if self.poisoned {
            return Err(BookError::Poisoned);
        }
        if mutation.order_key.is_empty() {
            return Err(BookError::MissingOrderKey);
        }

        let result = if mutation.kind.is_upsert() {
            self.upsert(mutation)
        } else {
            self.remove_resting(mutation.order_key.as_str())
        };
        self.poison_on_fatal(result)
    }

    /// Remove an order by key.
    pub fn remove(&mut self, key: &str) -> Result<Applied, BookError> {
        if self.poisoned {
            return Err(BookError::Poisoned);
        }
        let result = self.remove_resting(key);
        self.poison_on_fatal(result)
    }

    /// Drop every order and clear the poisoned flag.
    ///
    /// Used when (re)subscribing or after an invariant violation.
    pub fn clear(&mut self) {
        self.orders.clear();
        self.index.clear();
        self.bids.clear();
        self.asks.clear();
        self.poisoned = false;
    }

    fn upsert(&mut self, mutation: &BookMutation) -> Result<Applied, BookError> {
        let existing = self.resting_slot(mutation.order_key.as_str())?;
        let previous_entry = match existing {
            Some(slot) => Some(&self.node_or_err(slot)?.entry),
            None => None,
        };
        let entry = OrderEntry::build(mutation, previous_entry, self.order_id_mode)?;

        // Price and side may both move, so the old placement is always unlinked.
        let previous = match existing {
            Some(slot) => {
                let side = self.node_or_err(slot)?.side();
                let rank = self.rank_of_slot(slot);
                self.unlink(slot)?;
                Some(Placement { side, rank })
            }
            None => None,
        };

        let (side, price) = (entry.side(), entry.price());
        let order_key = entry.order_key().clone();
        let slot = self.orders.insert(OrderNode::new(entry));
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels.insert(slot, price, &mut self.orders)?;
        self.index.insert(order_key.clone(), slot);

        Ok(Applied {
            order_key,
            change: if previous.is_some() { Change::Replaced } else { Change::Inserted },
            side,
            rank: self.rank_of_slot(slot),
            previous,
        })
    }

    fn remove_resting(&mut self, key: &str) -> Result<Applied, BookError> {
        let slot = match self.resting_slot(key)? {
            Some(slot) => slot,
            None => return Err(BookError::UnknownKeyOnRemove(key.into())),
        };
        let side = self.node_or_err(slot)?.side();
        let rank = self.rank_of_slot(slot);
        let entry = self.unlink(slot)?;

        Ok(Applied {
            order_key: entry.order_key().clone(),
            change: Change::Removed,
            side,
            rank: None,
            previous: Some(Placement { side, rank }),
        })
    }

    /// Take an order out of its level, the slab and the key map.
    fn unlink(&mut self, slot: usize) -> Result<OrderEntry, BookError> {
        let node = self.node_or_err(slot)?;
        let (side, price) = (node.side(), node.price());
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels.remove(slot, price, &mut self.orders)?;

        let node = self
            .orders
            .try_remove(slot)
            .ok_or_else(|| BookError::invariant(format!("slot {slot} vanished during unlink")))?;
        if self.index.remove(node.entry.order_key().as_str()) != Some(slot) {
            return Err(BookError::invariant(format!(
                "key map did not point {} at slot {slot}",
                node.entry.order_key()
            )));
        }
        Ok(node.entry)
    }

    /// Point `key` at the slot holding `target`, leaving both price indices alone.
    #[cfg(test)]
    pub(crate) fn corrupt_key_map(&mut self, key: &str, target: &str) {
        if let Some(slot) = self.slot_of(target) {
            self.index.insert(OrderKey::from(key), slot);
        }
    }

    fn poison_on_fatal<T>(&mut self, result: Result<T, BookError>) -> Result<T, BookError> {
        if let Err(err) = &result {
            if err.is_fatal() {
                self.poisoned = true;
                error!(%err, orders = self.orders.len(), "order book poisoned");
            }
        }
        result
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current snapshot for a key
    pub fn get(&self, key: &str) -> Option<&OrderEntry> {
        let slot = *self.index.get(key)?;
        self.orders.get(slot).map(|node| &node.entry)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Price index of one side
    pub fn side_index(&self, side: Side) -> &PriceLevelIndex {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Distinct prices of one side, best first
    pub fn prices(&self, side: Side) -> Vec<Price> {
        self.side_index(side).prices().collect()
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Every order on one side in priority order (unbounded)
    pub fn iter_side(&self, side: Side) -> impl Iterator<Item = &OrderEntry> + '_ {
        self.slots(side)
            .filter_map(move |slot| self.orders.get(slot))
            .map(|node| &node.entry)
    }

    /// Read-only display projection bounded by the configured window
    pub fn projector(&self) -> DisplayProjector<'_> {
        DisplayProjector::new(self, self.window_size)
    }

    /// Display rank of a key, `None` if absent or outside the window
    pub fn rank_of(&self, key: &str) -> Option<usize> {
        self.projector().rank_of(key)
    }

    pub(crate) fn slot_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub(crate) fn node(&self, slot: usize) -> Option<&OrderNode> {
        self.orders.get(slot)
    }

    pub(crate) fn slots(&self, side: Side) -> impl Iterator<Item = usize> + '_ {
        self.side_index(side).keys(&self.orders)
    }

    fn rank_of_slot(&self, slot: usize) -> Option<usize> {
        self.projector().rank_of_slot(slot)
    }

    /// Slot of a resting key, checked against the entry stored there.
    fn resting_slot(&self, key: &str) -> Result<Option<usize>, BookError> {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => return Ok(None),
        };
        let stored = self.node_or_err(slot)?.entry.order_key();
        if stored.as_str() != key {
            return Err(BookError::invariant(format!("key {key} maps to slot holding {stored}")));
        }
        Ok(Some(slot))
    }

    fn node_or_err(&self, slot: usize) -> Result<&OrderNode, BookError> {
        self.orders
            .get(slot)
            .ok_or_else(|| BookError::invariant(format!("key map points at empty slot {slot}")))
    }

    // ========================================================================
    // Integrity
    // ========================================================================

    /// Cross-check the key map, the slab and both price indices.
    ///
    /// Every key must resolve to exactly one queued slot, on the side and at
    /// the price its entry claims.
    pub fn verify_integrity(&self) -> Result<(), BookError> {
        self.bids.verify(&self.orders)?;
        self.asks.verify(&self.orders)?;

        let mut seen = HashSet::with_capacity(self.orders.len());
        for side in Side::BOTH {
            for slot in self.slots(side) {
                if !seen.insert(slot) {
                    return Err(BookError::invariant(format!("slot {slot} queued twice")));
                }
            }
        }

        if seen.len() != self.orders.len() || self.index.len() != self.orders.len() {
            return Err(BookError::invariant(format!(
                "{} queued, {} stored, {} keyed",
                seen.len(),
                self.orders.len(),
                self.index.len()
            )));
        }

        for (key, &slot) in &self.index {
            let node = self.node_or_err(slot)?;
            if node.entry.order_key() != key {
                return Err(BookError::invariant(format!(
                    "key {key} maps to slot holding {}",
                    node.entry.order_key()
                )));
            }
            if !seen.contains(&slot) {
                return Err(BookError::invariant(format!("key {key} is not queued")));
            }
        }
        Ok(())
    }

    /// SHA-256 over both sides in priority order.
    ///
    /// Identical event sequences always produce identical roots.
    pub fn compute_state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        for side in Side::BOTH {
            hasher.update([if side.is_buy() { b'B' } else { b'S' }]);
            for entry in self.iter_side(side) {
                let price = entry.price().canonical();
                let fields = [
                    entry.order_key().as_str(),
                    price.as_str(),
                    entry.display_price(),
                    entry.display_size(),
                    entry.display_time(),
                    entry.display_date(),
                    entry.participant(),
                    entry.exchange(),
                    entry.order_id(),
                ];
                for field in fields {
                    hasher.update(field.as_bytes());
                    hasher.update([0u8]);
                }
            }
        }

        let mut root = [0u8; 32];
        root.copy_from_slice(&hasher.finalize());
        root
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn px(cents: i64) -> Price {
        Price::from_scaled(cents, 2)
    }

    fn add(key: &str, side: Side, cents: i64, size: &str) -> BookMutation {
        BookMutation::add(key, side)
            .with_price(px(cents))
            .with_size(size)
            .with_time("09:30:00")
            .with_date("2024-01-02")
            .with_participant("NSDQ")
    }

    fn seeded() -> OrderBook {
        let mut book = OrderBook::with_window(50);
        book.apply(&add("A1", Side::Buy, 1000, "100")).unwrap();
        book.apply(&add("A2", Side::Buy, 1005, "50")).unwrap();
        book.apply(&add("A3", Side::Sell, 1010, "75")).unwrap();
        book
    }

    #[test]
    fn test_book_new() {
        let book = OrderBook::default();

        assert!(book.is_empty());
        assert_eq!(book.window_size(), 50);
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
        book.verify_integrity().unwrap();
    }

    #[test]
    fn test_apply_add_and_rank() {
        let book = seeded();

        assert_eq!(book.len(), 3);
        assert_eq!(book.bid_count(), 2);
        assert_eq!(book.ask_count(), 1);
        assert_eq!(book.prices(Side::Buy), vec![px(1005), px(1000)]);
        assert_eq!(book.rank_of("A2"), Some(0));
        assert_eq!(book.rank_of("A1"), Some(1));
        assert_eq!(book.rank_of("A3"), Some(0));
        book.verify_integrity().unwrap();
    }

    #[test]
    fn test_apply_reports_insert() {
        let mut book = OrderBook::with_window(10);
        let applied = book.apply(&add("A1", Side::Buy, 1000, "100")).unwrap();

        assert_eq!(applied.change, Change::Inserted);
        assert_eq!(applied.side, Side::Buy);
        assert_eq!(applied.rank, Some(0));
        assert!(applied.previous.is_none());
        assert_eq!(applied.display_row(), Some(0));
    }

    #[test]
    fn test_remove() {
        let mut book = seeded();
        let applied = book.apply(&BookMutation::remove("A2")).unwrap();

        assert_eq!(applied.change, Change::Removed);
        assert_eq!(applied.rank, None);
        assert_eq!(applied.previous, Some(Placement { side: Side::Buy, rank: Some(0) }));
        assert_eq!(applied.display_row(), Some(0));
        assert_eq!(book.prices(Side::Buy), vec![px(1000)]);
        assert_eq!(book.rank_of("A1"), Some(0));
        assert_eq!(book.rank_of("A2"), None);
        assert!(!book.contains("A2"));
        book.verify_integrity().unwrap();
    }

    #[test]
    fn test_remove_twice_is_tolerated() {
        let mut once = seeded();
        once.remove("A2").unwrap();

        let mut twice = seeded();
        twice.remove("A2").unwrap();
        let err = twice.remove("A2").unwrap_err();

        assert_eq!(err, BookError::UnknownKeyOnRemove("A2".into()));
        assert!(!twice.is_poisoned());
        assert_eq!(once.compute_state_root(), twice.compute_state_root());
        twice.verify_integrity().unwrap();
    }

    #[test]
    fn test_update_size_keeps_level() {
        let mut book = seeded();
        let applied = book.apply(&BookMutation::update("A1").with_size("120")).unwrap();

        assert_eq!(applied.change, Change::Replaced);
        let entry = book.get("A1").unwrap();
        assert_eq!(entry.display_size(), "120");
        assert_eq!(entry.price(), px(1000));
        assert_eq!(entry.participant(), "NSDQ");
        assert_eq!(book.side_index(Side::Buy).level(&px(1000)).unwrap().order_count, 1);
        book.verify_integrity().unwrap();
    }

    #[test]
    fn test_update_moves_price_level() {
        let mut book = seeded();
        let applied = book
            .apply(&BookMutation::update("A1").with_price(px(1008)))
            .unwrap();

        assert_eq!(applied.previous, Some(Placement { side: Side::Buy, rank: Some(1) }));
        assert_eq!(applied.rank, Some(0));
        assert_eq!(book.prices(Side::Buy), vec![px(1008), px(1005)]);
        assert!(book.side_index(Side::Buy).level(&px(1000)).is_none());
        book.verify_integrity().unwrap();
    }

    #[test]
    fn test_update_moves_to_back_of_level() {
        let mut book = OrderBook::with_window(10);
        book.apply(&add("X", Side::Sell, 1010, "1")).unwrap();
        book.apply(&add("Y", Side::Sell, 1010, "1")).unwrap();
        assert_eq!(book.rank_of("X"), Some(0));

        book.apply(&BookMutation::update("X").with_size("2")).unwrap();
        assert_eq!(book.rank_of("Y"), Some(0));
        assert_eq!(book.rank_of("X"), Some(1));
    }

    #[test]
    fn test_update_flips_side() {
        let mut book = seeded();
        let applied = book
            .apply(&BookMutation::update("A1").with_side(Side::Sell).with_price(px(1020)))
            .unwrap();

        assert_eq!(applied.side, Side::Sell);
        assert_eq!(applied.previous.map(|p| p.side), Some(Side::Buy));
        assert_eq!(book.bid_count(), 1);
        assert_eq!(book.ask_count(), 2);
        assert_eq!(book.rank_of("A1"), Some(1));
        book.verify_integrity().unwrap();
    }

    #[test]
    fn test_refresh_of_existing_key_replaces() {
        let mut book = seeded();
        let refresh = BookMutation::refresh("A3", Side::Sell).with_size("80");
        let applied = book.apply(&refresh).unwrap();

        assert_eq!(applied.change, Change::Replaced);
        assert_eq!(book.len(), 3);
        assert_eq!(book.get("A3").unwrap().display_size(), "80");
    }

    #[test]
    fn test_malformed_order_leaves_book_untouched() {
        let mut book = seeded();
        let before = book.compute_state_root();

        let err = book
            .apply(&BookMutation::add("B1", Side::Buy).with_size("1"))
            .unwrap_err();

        assert!(matches!(err, BookError::MalformedOrder { .. }));
        assert!(!book.is_poisoned());
        assert_eq!(book.compute_state_root(), before);
        assert!(!book.contains("B1"));
    }

    #[test]
    fn test_missing_key_rejected() {
        let mut book = seeded();
        let err = book.apply(&BookMutation::update("")).unwrap_err();
        assert_eq!(err, BookError::MissingOrderKey);
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn test_rank_bounded_by_window() {
        let mut book = OrderBook::with_window(2);
        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            book.apply(&add(key, Side::Buy, 1000 - i as i64, "1")).unwrap();
        }

        assert_eq!(book.rank_of("a"), Some(0));
        assert_eq!(book.rank_of("b"), Some(1));
        assert_eq!(book.rank_of("c"), None);

        // Promotion once a higher order leaves
        book.remove("a").unwrap();
        assert_eq!(book.rank_of("c"), Some(1));
    }

    #[test]
    fn test_poisoned_book_rejects_events() {
        let mut book = seeded();
        book.poisoned = true;

        assert_eq!(book.apply(&BookMutation::remove("A1")), Err(BookError::Poisoned));
        book.clear();
        assert!(!book.is_poisoned());
        assert!(book.is_empty());
    }

    #[test]
    fn test_corrupted_index_poisons_book() {
        let mut book = seeded();
        book.corrupt_key_map("A1", "A3");

        assert!(book.verify_integrity().is_err());
        let err = book.remove("A1").unwrap_err();
        assert!(err.is_fatal());
        assert!(book.is_poisoned());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "window size must be at least 1")]
    fn test_zero_window_rejected() {
        let _ = OrderBook::with_window(0);
    }

    #[test]
    fn test_iter_side_priority_order() {
        let mut book = seeded();
        book.apply(&add("A4", Side::Buy, 1005, "10")).unwrap();

        let keys: Vec<&str> = book.iter_side(Side::Buy).map(|e| e.order_key().as_str()).collect();
        assert_eq!(keys, vec!["A2", "A4", "A1"]);
    }

    #[test]
    fn test_clear() {
        let mut book = seeded();
        book.clear();

        assert!(book.is_empty());
        assert_eq!(book.bid_count(), 0);
        assert_eq!(book.ask_count(), 0);
        assert!(book.best_bid().is_none());
        book.verify_integrity().unwrap();
    }

    #[test]
    fn test_state_root_tracks_content() {
        let a = seeded();
        let b = seeded();
        assert_eq!(a.compute_state_root(), b.compute_state_root());

        let mut c = seeded();
        c.apply(&BookMutation::update("A1").with_size("101")).unwrap();
        assert_ne!(a.compute_state_root(), c.compute_state_root());
    }
}
