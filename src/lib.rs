//! # Order Book Viewer
//!
//! Incremental, order-by-order book maintenance for a single instrument,
//! with a bounded top-of-book display window.
//!
//! ## Architecture
//!
//! - **Types**: Core data structures (OrderEntry, BookMutation, Price)
//! - **OrderBook**: Slab-backed key map plus one sorted price index per side
//! - **Display**: Window-bounded projection and an incrementally kept window
//! - **Session**: One subscription's book, window and feed statistics
//! - **Feed**: JSON-lines decoding for replay
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Identical event sequences produce identical books
//! 2. **Exact Prices**: Levels are keyed by decimal value, never floats
//! 3. **Carry-Forward**: Each update tags every field as updated or unchanged
//! 4. **Per-Event Failure**: A bad event is dropped; the stream continues

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: OrderEntry, BookMutation, Price
pub mod types;

/// Order book: key map and per-side price indices
pub mod orderbook;

/// Display projection and window
pub mod display;

/// Subscription state and feed statistics
pub mod session;

/// JSON-lines feed decoding
pub mod feed;

pub mod config;
pub mod error;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::{BookConfig, ConfigError};
pub use display::{DisplayProjector, DisplayRow, DisplayWindow};
pub use error::BookError;
pub use orderbook::{Applied, Change, OrderBook, Placement};
pub use session::{BookSession, BookStats};
pub use types::{BookMutation, FieldUpdate, MutationKind, OrderEntry, OrderIdMode, OrderKey, Price, Side};
