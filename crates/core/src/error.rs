//! Foundation error model.

use thiserror::Error;

/// Foundation-level error.
///
/// Keep this focused on deterministic validation failures of the primitives
/// defined here. Authorization outcomes are never errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier was invalid (empty, or contains whitespace).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl CoreError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
