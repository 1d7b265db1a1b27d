//! Feed decoding.
//!
//! The replay binary and the integration tests read book events as JSON
//! lines; see [`MutationRecord`] for the record layout.

pub mod reader;
pub mod record;

pub use reader::{parse_record, RecordReader};
pub use record::MutationRecord;

use thiserror::Error;

use crate::types::PriceError;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read feed: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: not valid UTF-8")]
    Encoding { line: usize },

    #[error("line {line}: malformed record: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: {source}")]
    Price {
        line: usize,
        #[source]
        source: PriceError,
    },
}

impl FeedError {
    /// Feed line the error came from, if it came from a record
    pub fn line(&self) -> Option<usize> {
        match self {
            FeedError::Io(_) => None,
            FeedError::Encoding { line } | FeedError::Json { line, .. } | FeedError::Price { line, .. } => {
                Some(*line)
            }
        }
    }
}
