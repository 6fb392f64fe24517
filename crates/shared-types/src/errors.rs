//! # Error Types
//!
//! Errors raised while constructing shared value types.

use thiserror::Error;

/// Errors produced when parsing shared value types from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The string is not a valid UUID.
    #[error("Invalid uid: {0}")]
    InvalidUid(String),

    /// The string is not a valid 32-byte hex digest.
    #[error("Invalid hash: expected 64 hex chars, got {0:?}")]
    InvalidHash(String),

    /// A network route could not be parsed.
    #[error("Invalid route: {0}")]
    InvalidRoute(String),
}
