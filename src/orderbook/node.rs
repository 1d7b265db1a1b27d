//! Order node for slab-based storage.
//!
//! ## Design
//!
//! `OrderNode` wraps an [`OrderEntry`] with doubly-linked list pointers so
//! an order can be unlinked from its price level in O(1) given its slab key.
//! The book exclusively owns every entry through the slab; price levels only
//! hold slab keys.
//!
//! ## Slab Integration
//!
//! Per official slab docs (https://docs.rs/slab/0.4.11):
//! - Keys are `usize` values returned by `slab.insert()`
//! - Keys may be reused after `slab.remove()`
//!
//! ## Linked List
//!
//! - `next`: the order that arrived after this one at the same price
//! - `prev`: the order that arrived before this one at the same price

use crate::types::{OrderEntry, Price, Side};

/// Arena node: an order snapshot plus its position in a price level queue.
#[derive(Debug, Clone)]
pub struct OrderNode {
    /// The order snapshot
    pub entry: OrderEntry,

    /// Next (newer) order in the price level queue, `None` at the tail
    pub next: Option<usize>,

    /// Previous (older) order in the price level queue, `None` at the head
    pub prev: Option<usize>,
}

impl OrderNode {
    /// Create a new, unlinked node
    #[inline]
    pub fn new(entry: OrderEntry) -> Self {
        Self {
            entry,
            next: None,
            prev: None,
        }
    }

    /// Check if this node has no neighbours
    #[inline]
    pub fn is_unlinked(&self) -> bool {
        self.next.is_none() && self.prev.is_none()
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.entry.price()
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.entry.side()
    }
}
