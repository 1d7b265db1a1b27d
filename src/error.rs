//! Error types for book maintenance.
//!
//! Per-event errors ([`BookError::MalformedOrder`],
//! [`BookError::UnknownKeyOnRemove`], [`BookError::MissingOrderKey`]) drop
//! the offending event and leave the book untouched. The stream carries on.
//!
//! [`BookError::InvariantViolation`] means the book's indices disagree with
//! each other. The book poisons itself and must be cleared and rebuilt from
//! a fresh refresh.

use thiserror::Error;

use crate::types::OrderKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// Required field(s) absent on the first event seen for a key
    #[error("malformed order {key}: missing {}", .missing.join(", "))]
    MalformedOrder {
        key: OrderKey,
        missing: Vec<&'static str>,
    },

    /// Remove for a key that is not resting (late or duplicate remove)
    #[error("remove for unknown order {0}")]
    UnknownKeyOnRemove(OrderKey),

    /// Event carries an empty order key
    #[error("mutation has no order key")]
    MissingOrderKey,

    /// Global map and a side's price index disagree
    #[error("book invariant violated: {0}")]
    InvariantViolation(String),

    /// The book hit an invariant violation earlier and refuses further events
    #[error("book is poisoned and must be rebuilt")]
    Poisoned,
}

impl BookError {
    pub(crate) fn invariant(detail: impl Into<String>) -> Self {
        BookError::InvariantViolation(detail.into())
    }

    /// `true` if the book instance can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(self, BookError::InvariantViolation(_) | BookError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BookError::MalformedOrder {
            key: OrderKey::from("A1"),
            missing: vec!["price", "size"],
        };
        assert_eq!(err.to_string(), "malformed order A1: missing price, size");
        assert_eq!(
            BookError::UnknownKeyOnRemove("X".into()).to_string(),
            "remove for unknown order X"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(BookError::invariant("level missing").is_fatal());
        assert!(BookError::Poisoned.is_fatal());
        assert!(!BookError::MissingOrderKey.is_fatal());
        assert!(!BookError::UnknownKeyOnRemove("X".into()).is_fatal());
    }
}
