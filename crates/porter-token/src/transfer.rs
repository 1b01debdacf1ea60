//! Transfer receipts returned by the value sources.

use std::fmt;

use chrono::{DateTime, Utc};
use porter_core::{Address, Amount};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique transfer receipt identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(String);

impl TransferId {
    /// Creates a new random transfer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("xfer-{}", Uuid::new_v4()))
    }

    /// Returns the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A receipt for a completed value movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Receipt ID.
    pub id: TransferId,
    /// Account debited.
    pub from: Address,
    /// Account credited.
    pub to: Address,
    /// Amount moved.
    pub amount: Amount,
    /// When the transfer was applied.
    pub at: DateTime<Utc>,
}

impl Transfer {
    /// Creates a receipt for a transfer applied now.
    #[must_use]
    pub fn new(from: Address, to: Address, amount: Amount) -> Self {
        Self {
            id: TransferId::new(),
            from,
            to,
            amount,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use porter_core::Wallet;

    #[test]
    fn receipt_ids_are_unique() {
        assert_ne!(TransferId::new(), TransferId::new());
    }

    #[test]
    fn receipt_records_parties_and_amount() {
        let from = Wallet::generate();
        let to = Wallet::generate();
        let receipt = Transfer::new(
            from.address().clone(),
            to.address().clone(),
            Amount::from_whole(3),
        );

        assert_eq!(&receipt.from, from.address());
        assert_eq!(&receipt.to, to.address());
        assert_eq!(receipt.amount, Amount::from_whole(3));
        assert!(receipt.id.as_str().starts_with("xfer-"));
    }

    #[test]
    fn receipt_serde_roundtrip() {
        let receipt = Transfer::new(
            Wallet::generate().address().clone(),
            Wallet::generate().address().clone(),
            Amount::from_units(42),
        );
        let json = serde_json::to_string(&receipt).unwrap();
        let restored: Transfer = serde_json::from_str(&json).unwrap();
        assert_eq!(receipt.id, restored.id);
        assert_eq!(receipt.amount, restored.amount);
    }
}
