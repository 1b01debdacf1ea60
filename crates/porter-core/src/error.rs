//! Error types for porter-core.

use thiserror::Error;

/// Errors that can occur when constructing core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid amount (overflow, bad decimal notation, or negative).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid address (bad base58 or wrong length).
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
