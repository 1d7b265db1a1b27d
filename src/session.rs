//! Subscription-scoped book state.
//!
//! A [`BookSession`] owns one [`OrderBook`], the [`DisplayWindow`] drawn from
//! it, and the feed statistics for the current subscription. Every event goes
//! through [`BookSession::process`], which applies it, keeps the window in
//! step and decides what to do with failures:
//!
//! | Error | Action |
//! |-------|--------|
//! | `UnknownKeyOnRemove` | drop the event, `debug!` |
//! | `MalformedOrder`, `MissingOrderKey` | drop the event, `warn!` |
//! | `InvariantViolation`, `Poisoned` | discard the book, `error!`, wait for a fresh image |

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::BookConfig;
use crate::display::{DisplayRow, DisplayWindow};
use crate::error::BookError;
use crate::orderbook::OrderBook;
use crate::types::{BookMutation, MutationKind};

/// Counters for the current subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookStats {
    /// Initial-image events received
    pub refreshes: u64,
    /// Incremental events received
    pub updates: u64,
    /// Events rejected by the book
    pub dropped: u64,
    /// Times the book was discarded after an invariant violation
    pub rebuilds: u64,
    pub subscribed_at: Option<Instant>,
    pub first_refresh_at: Option<Instant>,
    /// First time either side showed a full window
    pub window_filled_at: Option<Instant>,
}

impl BookStats {
    fn started(now: Instant) -> Self {
        Self {
            subscribed_at: Some(now),
            ..Self::default()
        }
    }

    /// Delay between subscribing and the first refresh
    pub fn time_to_first_refresh(&self) -> Option<Duration> {
        Some(self.first_refresh_at?.duration_since(self.subscribed_at?))
    }

    /// Delay between subscribing and the window first filling
    pub fn time_to_full_window(&self) -> Option<Duration> {
        Some(self.window_filled_at?.duration_since(self.subscribed_at?))
    }
}

#[derive(Debug)]
pub struct BookSession {
    symbol: Option<String>,
    book: OrderBook,
    window: DisplayWindow,
    stats: BookStats,
}

impl BookSession {
    pub fn new(config: &BookConfig) -> Self {
        Self {
            symbol: None,
            book: OrderBook::new(config),
            window: DisplayWindow::new(config.window_size),
            stats: BookStats::default(),
        }
    }

    /// Start a subscription: empty book, empty window, fresh statistics.
    pub fn subscribe(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        info!(%symbol, window = self.window.size(), "subscribed");

        self.book.clear();
        self.window.clear();
        self.stats = BookStats::started(Instant::now());
        self.symbol = Some(symbol);
    }

    pub fn unsubscribe(&mut self) {
        if let Some(symbol) = self.symbol.take() {
            info!(%symbol, orders = self.book.len(), "unsubscribed");
        }
        self.book.clear();
        self.window.clear();
    }

    /// Apply one event.
    ///
    /// Returns the first display row to repaint, `None` if the window did not
    /// change. Errors are counted and logged; the caller can keep feeding
    /// events after any of them.
    pub fn process(&mut self, mutation: &BookMutation) -> Result<Option<usize>, BookError> {
        let now = Instant::now();
        if mutation.kind == MutationKind::Refresh {
            self.stats.refreshes += 1;
            self.stats.first_refresh_at.get_or_insert(now);
        } else {
            self.stats.updates += 1;
        }

        match self.book.apply(mutation) {
            Ok(applied) => {
                let row = self.window.on_applied(&self.book, &applied);
                if row.is_some() && self.stats.window_filled_at.is_none() && self.window.is_full() {
                    self.stats.window_filled_at = Some(now);
                    debug!(rows = self.window.size(), "display window filled");
                }
                Ok(row)
            }
            Err(err) => {
                self.stats.dropped += 1;
                match &err {
                    BookError::UnknownKeyOnRemove(key) => debug!(%key, "ignoring remove for unknown order"),
                    fatal if fatal.is_fatal() => {
                        error!(err = %fatal, orders = self.book.len(), "discarding book, awaiting fresh image");
                        self.book.clear();
                        self.window.clear();
                        self.stats.rebuilds += 1;
                    }
                    other => warn!(err = %other, "dropped feed event"),
                }
                Err(err)
            }
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn window(&self) -> &DisplayWindow {
        &self.window
    }

    pub fn stats(&self) -> &BookStats {
        &self.stats
    }

    /// Current display rows, blank rows included
    pub fn rows(&self) -> Vec<DisplayRow<'_>> {
        self.book.projector().rows()
    }
}
