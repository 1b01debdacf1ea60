//! The native coin bank.
//!
//! Models native-currency balances for every participant, including the
//! marketplace ledger's own escrow account. An operation that requires
//! "attached value" debits the caller here as its first, pre-validated
//! transfer; a failure anywhere aborts before any balance moves.

use std::collections::HashMap;

use porter_core::{Address, Amount};
use tracing::debug;

use crate::error::TokenError;
use crate::transfer::Transfer;

/// Account book for the native settlement currency.
#[derive(Debug, Default)]
pub struct NativeBank {
    accounts: HashMap<Address, Amount>,
}

impl NativeBank {
    /// Creates an empty bank.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the balance of an account (zero if unknown).
    #[must_use]
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.accounts.get(address).copied().unwrap_or(Amount::ZERO)
    }

    /// Credits an account out of thin air. Used by the external harness to
    /// provision balances.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::AmountOverflow` if the balance would overflow.
    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::AmountOverflow)?;
        self.accounts.insert(to.clone(), credited);

        debug!(to = %to, amount = %amount, "native mint");
        Ok(())
    }

    /// Moves native value between accounts.
    ///
    /// Both sides are validated before either balance is written, so a
    /// failure leaves the bank untouched.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InsufficientBalance` if `from` cannot cover the
    /// amount, or `TokenError::AmountOverflow` if `to` would overflow.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<Transfer, TokenError> {
        let available = self.balance_of(from);
        let debited = available
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                required: amount,
                available,
            })?;

        if from == to {
            // Net zero, but the sender must still be able to cover it
            return Ok(Transfer::new(from.clone(), to.clone(), amount));
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::AmountOverflow)?;

        self.accounts.insert(from.clone(), debited);
        self.accounts.insert(to.clone(), credited);

        debug!(from = %from, to = %to, amount = %amount, "native transfer");
        Ok(Transfer::new(from.clone(), to.clone(), amount))
    }
}
