//! Per-side price level index.
//!
//! ## Structure
//!
//! - `levels`: price -> [`PriceLevel`] (FIFO queue of slab keys)
//! - the distinct prices, kept sorted by the `BTreeMap` itself
//!
//! A price is present iff its level is non-empty. The sorted price sequence
//! only changes when a level is created or dropped; adding or removing an
//! order inside an existing level never touches it.
//!
//! ## Priority Order
//!
//! | Side | Best price | Traversal |
//! |------|------------|-----------|
//! | Buy  | highest    | descending |
//! | Sell | lowest     | ascending  |

use std::collections::btree_map::{self, BTreeMap};

use slab::Slab;
use tracing::trace;

use crate::error::BookError;
use crate::orderbook::{OrderNode, PriceLevel};
use crate::types::{Price, Side};

/// Price-priority structure for one side of the book.
#[derive(Debug, Clone)]
pub struct PriceLevelIndex {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
    order_count: usize,
}

impl PriceLevelIndex {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            order_count: 0,
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of resting orders on this side
    #[inline]
    pub fn order_count(&self) -> usize {
        self.order_count
    }

    /// Number of distinct prices on this side
    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Queue an order at the tail of `price`.
    ///
    /// Returns `true` if `price` was new to this side.
    pub fn insert(&mut self, key: usize, price: Price, slab: &mut Slab<OrderNode>) -> Result<bool, BookError> {
        let created = !self.levels.contains_key(&price);
        let level = self.levels.entry(price).or_insert_with(|| PriceLevel::new(price));
        level.push_back(key, slab)?;
        self.order_count += 1;

        if created {
            trace!(side = %self.side, %price, "price level added");
        }
        Ok(created)
    }

    /// Unlink an order from the level at `price`.
    ///
    /// Returns `true` if that level became empty and was dropped.
    pub fn remove(&mut self, key: usize, price: Price, slab: &mut Slab<OrderNode>) -> Result<bool, BookError> {
        let level = self
            .levels
            .get_mut(&price)
            .ok_or_else(|| BookError::invariant(format!("{} level {price} missing for slot {key}", self.side)))?;
        level.remove(key, slab)?;
        self.order_count -= 1;

        if level.is_empty() {
            self.levels.remove(&price);
            trace!(side = %self.side, %price, "price level removed");
            return Ok(true);
        }
        Ok(false)
    }

    /// Level at an exact price
    pub fn level(&self, price: &Price) -> Option<&PriceLevel> {
        self.levels.get(price)
    }

    /// Best price on this side
    pub fn best_price(&self) -> Option<Price> {
        self.levels().next().map(|level| level.price)
    }

    /// Levels from best to worst
    pub fn levels(&self) -> PriorityLevels<'_> {
        PriorityLevels {
            inner: self.levels.values(),
            descending: self.side.is_buy(),
        }
    }

    /// Distinct prices from best to worst
    pub fn prices(&self) -> impl Iterator<Item = Price> + '_ {
        self.levels().map(|level| level.price)
    }

    /// Every slab key on this side in priority order: best price first, then
    /// arrival order within a price.
    pub fn keys<'a>(&'a self, slab: &'a Slab<OrderNode>) -> impl Iterator<Item = usize> + 'a {
        self.levels().flat_map(move |level| level.iter(slab))
    }

    pub fn clear(&mut self) {
        self.levels.clear();
        self.order_count = 0;
    }

    /// Check every level's queue and that node sides match this index.
    pub fn verify(&self, slab: &Slab<OrderNode>) -> Result<(), BookError> {
        let mut total = 0;
        for (price, level) in &self.levels {
            if level.price != *price {
                return Err(BookError::invariant(format!(
                    "{} level keyed {price} claims price {}",
                    self.side, level.price
                )));
            }
            if level.is_empty() {
                return Err(BookError::invariant(format!("{} level {price} is empty", self.side)));
            }
            level.verify(slab)?;
            for key in level.iter(slab) {
                if slab.get(key).map(|node| node.side()) != Some(self.side) {
                    return Err(BookError::invariant(format!("slot {key} queued on the wrong side ({})", self.side)));
                }
            }
            total += level.order_count;
        }

        if total != self.order_count {
            return Err(BookError::invariant(format!(
                "{} side counts {} orders, levels hold {total}",
                self.side, self.order_count
            )));
        }
        Ok(())
    }
}

/// Levels of one side in priority order.
pub struct PriorityLevels<'a> {
    inner: btree_map::Values<'a, Price, PriceLevel>,
    descending: bool,
}

impl<'a> Iterator for PriorityLevels<'a> {
    type Item = &'a PriceLevel;

    fn next(&mut self) -> Option<Self::Item> {
        if self.descending {
            self.inner.next_back()
        } else {
            self.inner.next()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
