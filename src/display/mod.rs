//! Display side of the viewer.
//!
//! - [`DisplayProjector`]: window-bounded, read-only queries on a book
//! - [`DisplayRow`]: one bid and one ask at the same rank
//! - [`DisplayWindow`]: cached window updated from [`crate::orderbook::Applied`]

pub mod projector;
pub mod window;

pub use projector::{DisplayProjector, DisplayRow};
pub use window::DisplayWindow;
