//! Price level management for orders at the same price.
//!
//! ## Design
//!
//! A `PriceLevel` is the set of order keys resting at one price, in arrival
//! order. It is a doubly-linked list threaded through the slab:
//!
//! ```text
//! head (oldest) <-> order2 <-> order3 <-> tail (newest)
//! ```
//!
//! - New and replaced orders are appended at the tail
//! - Any order can be unlinked in O(1) using its slab key
//!
//! Link corruption is reported as [`BookError::InvariantViolation`] rather
//! than a panic, so the owning book can poison itself.

use slab::Slab;

use crate::error::BookError;
use crate::orderbook::OrderNode;
use crate::types::Price;

/// Queue metadata for one price. Order data lives in the slab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevel {
    /// Price shared by every order in this level
    pub price: Price,

    /// Oldest order (slab key)
    pub head: Option<usize>,

    /// Newest order (slab key)
    pub tail: Option<usize>,

    /// Number of orders at this level
    pub order_count: usize,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new(price: Price) -> Self {
        Self {
            price,
            head: None,
            tail: None,
            order_count: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Append an order at the tail of the queue.
    pub fn push_back(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> Result<(), BookError> {
        let tail = self.tail;
        let node = slab
            .get_mut(key)
            .ok_or_else(|| BookError::invariant(format!("slot {key} missing while linking at {}", self.price)))?;
        node.prev = tail;
        node.next = None;

        match tail {
            Some(tail_key) => {
                let tail_node = slab
                    .get_mut(tail_key)
                    .ok_or_else(|| BookError::invariant(format!("tail slot {tail_key} missing at {}", self.price)))?;
                tail_node.next = Some(key);
            }
            None => self.head = Some(key),
        }

        self.tail = Some(key);
        self.order_count += 1;
        Ok(())
    }

    /// Unlink an order from anywhere in the queue.
    ///
    /// The node stays in the slab; the caller removes it.
    pub fn remove(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> Result<(), BookError> {
        if self.order_count == 0 {
            return Err(BookError::invariant(format!("unlink of slot {key} from empty level {}", self.price)));
        }

        let node = slab
            .get(key)
            .ok_or_else(|| BookError::invariant(format!("slot {key} missing while unlinking at {}", self.price)))?;
        if node.price() != self.price {
            return Err(BookError::invariant(format!(
                "slot {key} priced {} unlinked from level {}",
                node.price(),
                self.price
            )));
        }
        let (prev_key, next_key) = (node.prev, node.next);

        match prev_key {
            Some(prev) => {
                slab.get_mut(prev)
                    .ok_or_else(|| BookError::invariant(format!("prev slot {prev} missing at {}", self.price)))?
                    .next = next_key;
            }
            None => self.head = next_key,
        }

        match next_key {
            Some(next) => {
                slab.get_mut(next)
                    .ok_or_else(|| BookError::invariant(format!("next slot {next} missing at {}", self.price)))?
                    .prev = prev_key;
            }
            None => self.tail = prev_key,
        }

        if let Some(node) = slab.get_mut(key) {
            node.prev = None;
            node.next = None;
        }

        self.order_count -= 1;
        Ok(())
    }

    /// Iterate slab keys from oldest to newest
    pub fn iter<'a>(&self, slab: &'a Slab<OrderNode>) -> LevelIter<'a> {
        LevelIter {
            slab,
            cur: self.head,
        }
    }

    /// Walk the queue and check links, prices and the cached count.
    pub fn verify(&self, slab: &Slab<OrderNode>) -> Result<(), BookError> {
        let mut count = 0;
        let mut prev = None;
        let mut cur = self.head;

        while let Some(key) = cur {
            let node = slab
                .get(key)
                .ok_or_else(|| BookError::invariant(format!("level {} links to missing slot {key}", self.price)))?;
            if node.prev != prev {
                return Err(BookError::invariant(format!("broken back link at slot {key} in level {}", self.price)));
            }
            if node.price() != self.price {
                return Err(BookError::invariant(format!(
                    "slot {key} priced {} queued at level {}",
                    node.price(),
                    self.price
                )));
            }
            count += 1;
            if count > self.order_count {
                return Err(BookError::invariant(format!("level {} queue longer than its count", self.price)));
            }
            prev = Some(key);
            cur = node.next;
        }

        if prev != self.tail || count != self.order_count {
            return Err(BookError::invariant(format!(
                "level {} holds {count} orders, expected {}",
                self.price, self.order_count
            )));
        }
        Ok(())
    }
}

/// FIFO iterator over a level's slab keys.
pub struct LevelIter<'a> {
    slab: &'a Slab<OrderNode>,
    cur: Option<usize>,
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cur?;
        self.cur = self.slab.get(key).and_then(|node| node.next);
        Some(key)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
