//! Cached top-of-book window, kept in step with the book event by event.
//!
//! A mutation can only change one side's window if the order was inside the
//! window before the event or is inside it after. [`DisplayWindow::on_applied`]
//! uses the ranks reported in [`Applied`] to skip every other case, so events
//! deep in the book cost nothing here.

use crate::orderbook::{Applied, OrderBook};
use crate::types::{OrderKey, Side};

/// Keys currently displayed on each side, best first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayWindow {
    size: usize,
    bids: Vec<OrderKey>,
    asks: Vec<OrderKey>,
}

impl DisplayWindow {
    /// Empty window of `size` rows. Must match the book's window size.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            bids: Vec::with_capacity(size),
            asks: Vec::with_capacity(size),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Re-project both sides from scratch.
    pub fn rebuild(&mut self, book: &OrderBook) {
        for side in Side::BOTH {
            self.reproject(book, side);
        }
    }

    /// Bring the window up to date after `applied`.
    ///
    /// Returns the first row that changed, or `None` when the event happened
    /// entirely outside the window.
    pub fn on_applied(&mut self, book: &OrderBook, applied: &Applied) -> Option<usize> {
        let mut first = None;
        for side in Side::BOTH {
            if let Some(row) = applied.first_dirty_row(side) {
                self.reproject(book, side);
                first = Some(first.map_or(row, |f: usize| f.min(row)));
            }
        }
        first
    }

    /// Displayed keys for one side
    pub fn keys(&self, side: Side) -> &[OrderKey] {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// `(bid, ask)` keys at row `index`, `None` past the window
    pub fn row(&self, index: usize) -> Option<(Option<&OrderKey>, Option<&OrderKey>)> {
        if index >= self.size {
            return None;
        }
        Some((self.bids.get(index), self.asks.get(index)))
    }

    /// At least one side shows a full window of orders
    pub fn is_full(&self) -> bool {
        self.size > 0 && (self.bids.len() == self.size || self.asks.len() == self.size)
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    fn reproject(&mut self, book: &OrderBook, side: Side) {
        let keys = book
            .projector()
            .project_top_n(side, self.size)
            .into_iter()
            .cloned();
        let target = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        target.clear();
        target.extend(keys);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookMutation, Price};

    fn add(key: &str, side: Side, cents: i64) -> BookMutation {
        BookMutation::add(key, side)
            .with_price(Price::from_scaled(cents, 2))
            .with_size("10")
            .with_time("t")
            .with_date("d")
            .with_participant("p")
    }

    fn fresh(book: &OrderBook, size: usize) -> DisplayWindow {
        let mut window = DisplayWindow::new(size);
        window.rebuild(book);
        window
    }

    #[test]
    fn test_insert_inside_window() {
        let mut book = OrderBook::with_window(2);
        let mut window = DisplayWindow::new(2);

        let applied = book.apply(&add("a", Side::Buy, 1000)).unwrap();
        assert_eq!(window.on_applied(&book, &applied), Some(0));

        let applied = book.apply(&add("b", Side::Buy, 1005)).unwrap();
        assert_eq!(window.on_applied(&book, &applied), Some(0));
        assert_eq!(window, fresh(&book, 2));
        assert!(window.is_full());
    }

    #[test]
    fn test_event_outside_window_is_skipped() {
        let mut book = OrderBook::with_window(2);
        let mut window = DisplayWindow::new(2);
        for m in [add("a", Side::Buy, 1005), add("b", Side::Buy, 1000)] {
            let applied = book.apply(&m).unwrap();
            window.on_applied(&book, &applied);
        }

        let applied = book.apply(&add("c", Side::Buy, 990)).unwrap();
        assert_eq!(window.on_applied(&book, &applied), None);

        let applied = book.apply(&BookMutation::remove("c")).unwrap();
        assert_eq!(window.on_applied(&book, &applied), None);
        assert_eq!(window, fresh(&book, 2));
    }

    #[test]
    fn test_remove_promotes_next_order() {
        let mut book = OrderBook::with_window(2);
        let mut window = DisplayWindow::new(2);
        for m in [add("a", Side::Buy, 1005), add("b", Side::Buy, 1000), add("c", Side::Buy, 995)] {
            let applied = book.apply(&m).unwrap();
            window.on_applied(&book, &applied);
        }

        let applied = book.apply(&BookMutation::remove("a")).unwrap();
        assert_eq!(window.on_applied(&book, &applied), Some(0));
        assert_eq!(window.keys(Side::Buy), &[OrderKey::from("b"), OrderKey::from("c")]);
    }

    #[test]
    fn test_side_flip_repaints_both_sides() {
        let mut book = OrderBook::with_window(3);
        let mut window = DisplayWindow::new(3);
        for m in [add("a", Side::Buy, 1000), add("s", Side::Sell, 1010)] {
            let applied = book.apply(&m).unwrap();
            window.on_applied(&book, &applied);
        }

        let flip = BookMutation::update("a").with_side(Side::Sell).with_price(Price::from_scaled(1020, 2));
        let applied = book.apply(&flip).unwrap();

        assert_eq!(window.on_applied(&book, &applied), Some(0));
        assert!(window.keys(Side::Buy).is_empty());
        assert_eq!(window.row(1), Some((None, Some(&OrderKey::from("a")))));
        assert_eq!(window, fresh(&book, 3));
    }

    #[test]
    fn test_row_past_window() {
        let window = DisplayWindow::new(2);
        assert_eq!(window.row(1), Some((None, None)));
        assert_eq!(window.row(2), None);
        assert!(!window.is_full());
    }
}
