//! Error types for porter-ledger.
//!
//! Every operation aborts with one of these and zero partial state change.
//! Retry is the caller's responsibility; nothing is retried internally.

use porter_core::Amount;
use porter_token::TokenError;
use thiserror::Error;

/// Errors that can occur in ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller is not the party the operation requires.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Operation invalid for the entity's current lifecycle state
    /// (re-payment, duplicate review, refund after fulfillment, ...).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed input (rating out of range, empty required text, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Attached or approved value does not cover the requirement.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount the operation requires.
        required: Amount,
        /// Amount actually attached, approved or held.
        available: Amount,
    },

    /// Unknown id or out-of-range index.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity looked up.
        entity: &'static str,
        /// The id or index that failed to resolve.
        id: u64,
    },
}

impl From<TokenError> for LedgerError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InsufficientBalance {
                required,
                available,
            } => Self::InsufficientFunds {
                required,
                available,
            },
            TokenError::InsufficientAllowance { required, approved } => {
                Self::InsufficientFunds {
                    required,
                    available: approved,
                }
            }
            TokenError::AmountOverflow => Self::Validation("amount overflow".into()),
        }
    }
}
