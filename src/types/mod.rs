//! Core data types for the order book viewer
//!
//! ## Types
//!
//! - [`OrderEntry`]: immutable display snapshot of one resting order
//! - [`Side`]: Buy (bid) or Sell (ask)
//! - [`OrderKey`]: feed-assigned unique order identifier
//! - [`BookMutation`]: one incremental feed event with per-field update tags
//! - [`Price`]: exact decimal price used for level grouping

mod order;
mod mutation;
pub mod price;

pub use order::{OrderEntry, OrderIdMode, OrderKey, Side};
pub use mutation::{BookMutation, FieldUpdate, MutationKind, PriceField};
pub use price::{Price, PriceError};
