//! Configuration for an order book.
//!
//! Defaults can be used as-is, or overridden from a TOML file:
//!
//! ```toml
//! window_size = 50          # rows displayed per side
//! order_id_mode = "key"     # or "field"
//! initial_capacity = 1024   # pre-allocated order slots
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::types::OrderIdMode;

/// Rows per side shown by the original viewer
pub const DEFAULT_WINDOW_SIZE: usize = 50;

pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("window size must be at least 1")]
    InvalidWindowSize,
}

/// Book configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    /// Maximum number of displayed rows per side.
    pub window_size: usize,

    /// How `OrderEntry::order_id` is populated.
    pub order_id_mode: OrderIdMode,

    /// Number of order slots allocated up front.
    pub initial_capacity: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            order_id_mode: OrderIdMode::Key,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl BookConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: BookConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::InvalidWindowSize);
        }
        Ok(())
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_order_id_mode(mut self, mode: OrderIdMode) -> Self {
        self.order_id_mode = mode;
        self
    }
}
