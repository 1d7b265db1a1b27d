//! Read-only projection of a book onto its display window.

use crate::orderbook::OrderBook;
use crate::types::{OrderEntry, OrderKey, Side};

/// One display row: the bid and ask at the same rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayRow<'a> {
    pub index: usize,
    pub bid: Option<&'a OrderEntry>,
    pub ask: Option<&'a OrderEntry>,
}

impl DisplayRow<'_> {
    /// Neither side has an order at this rank
    pub fn is_blank(&self) -> bool {
        self.bid.is_none() && self.ask.is_none()
    }
}

/// Window-bounded view of an [`OrderBook`].
///
/// Traversal is price priority (descending bids, ascending asks), then
/// arrival order within a price. Nothing past `window` orders is visited.
#[derive(Debug, Clone, Copy)]
pub struct DisplayProjector<'a> {
    book: &'a OrderBook,
    window: usize,
}

impl<'a> DisplayProjector<'a> {
    pub fn new(book: &'a OrderBook, window: usize) -> Self {
        Self { book, window }
    }

    #[inline]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Zero-based rank of `key` on its side, `None` if the key is unknown
    /// or sits at or beyond the window.
    pub fn rank_of(&self, key: &str) -> Option<usize> {
        let slot = self.book.slot_of(key)?;
        self.rank_of_slot(slot)
    }

    pub(crate) fn rank_of_slot(&self, slot: usize) -> Option<usize> {
        let side = self.book.node(slot)?.side();
        self.book.slots(side).take(self.window).position(|s| s == slot)
    }

    /// Keys of the first `min(n, window)` orders on `side`
    pub fn project_top_n(&self, side: Side, n: usize) -> Vec<&'a OrderKey> {
        self.entries_top_n(side, n)
            .into_iter()
            .map(OrderEntry::order_key)
            .collect()
    }

    /// Entries of the first `min(n, window)` orders on `side`
    pub fn entries_top_n(&self, side: Side, n: usize) -> Vec<&'a OrderEntry> {
        self.book.iter_side(side).take(n.min(self.window)).collect()
    }

    /// Every row of the window, blank rows included
    pub fn rows(&self) -> Vec<DisplayRow<'a>> {
        self.rows_from(0)
    }

    /// Rows `from..window`, as repainted after a change at row `from`
    pub fn rows_from(&self, from: usize) -> Vec<DisplayRow<'a>> {
        let bids = self.entries_top_n(Side::Buy, self.window);
        let asks = self.entries_top_n(Side::Sell, self.window);

        (from..self.window)
            .map(|index| DisplayRow {
                index,
                bid: bids.get(index).copied(),
                ask: asks.get(index).copied(),
            })
            .collect()
    }
}
