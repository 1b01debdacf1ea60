//! Error types for porter-token.

use porter_core::Amount;
use thiserror::Error;

/// Errors that can occur in value-source operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Account balance below the required amount.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount required for the operation.
        required: Amount,
        /// Amount currently available.
        available: Amount,
    },

    /// Spender allowance below the required amount.
    #[error("insufficient allowance: required {required}, approved {approved}")]
    InsufficientAllowance {
        /// Amount required for the operation.
        required: Amount,
        /// Amount currently approved.
        approved: Amount,
    },

    /// A balance would overflow the representable range.
    #[error("amount overflow")]
    AmountOverflow,
}
