//! Order book module for the viewer.
//!
//! ## Architecture
//!
//! The book is an order-by-order (level 3) book with:
//!
//! - **Slab-based storage**: O(1) order insertion, removal, and lookup
//! - **Price levels**: Orders grouped by price using BTreeMap
//! - **Price-time priority**: FIFO ordering at each price level
//!
//! ## Components
//!
//! - [`OrderNode`]: Wrapper around `OrderEntry` with linked-list pointers for price level
//! - [`PriceLevel`]: Collection of orders at a single price point
//! - [`PriceLevelIndex`]: Sorted levels for one side
//! - [`OrderBook`]: Key map plus bid/ask indices
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Insert order | O(log p) |
//! | Remove order by key | O(log p) |
//! | Replace order | O(log p) |
//! | Best bid/ask | O(log p) |
//! | Rank lookup | O(w), bounded by the window |
//!
//! *p = distinct prices on the side, w = window size*
//!
//! ## Example
//!
//! ```
//! use orderbook_viewer::orderbook::OrderBook;
//! use orderbook_viewer::types::{BookMutation, Price, Side};
//!
//! let mut book = OrderBook::with_window(10);
//!
//! let ask = BookMutation::add("A3", Side::Sell)
//!     .with_price("10.10".parse::<Price>().unwrap())
//!     .with_size("75")
//!     .with_time("09:30:01")
//!     .with_date("2024-01-02")
//!     .with_participant("ARCA");
//! book.apply(&ask).unwrap();
//!
//! assert_eq!(book.best_ask(), Some(Price::from_scaled(1010, 2)));
//! assert_eq!(book.rank_of("A3"), Some(0));
//! ```

pub mod node;
pub mod level;
pub mod index;
pub mod book;

pub use node::OrderNode;
pub use level::{LevelIter, PriceLevel};
pub use index::{PriceLevelIndex, PriorityLevels};
pub use book::{Applied, Change, OrderBook, Placement};
