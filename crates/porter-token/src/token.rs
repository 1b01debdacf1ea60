//! The platform token ledger.
//!
//! A minimal fungible-token account book with the surface the marketplace
//! ledger consumes: `balance_of`, `approve`/`allowance`, `transfer` and
//! `transfer_from`. Token-settled invoices are funded by `transfer_from`
//! against a prior allowance; there is no attached-value path.

use std::collections::HashMap;

use porter_core::{Address, Amount};
use tracing::{debug, info};

use crate::error::TokenError;
use crate::transfer::Transfer;

/// Account book for the platform token.
#[derive(Debug, Default)]
pub struct TokenLedger {
    balances: HashMap<Address, Amount>,
    // (owner, spender) -> remaining approved amount
    allowances: HashMap<(Address, Address), Amount>,
}

impl TokenLedger {
    /// Creates an empty token ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the token balance of an account (zero if unknown).
    #[must_use]
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(Amount::ZERO)
    }

    /// Returns the amount `spender` may still pull from `owner`.
    #[must_use]
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
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
        self.balances.insert(to.clone(), credited);

        debug!(to = %to, amount = %amount, "token mint");
        Ok(())
    }

    /// Approves `spender` to pull up to `amount` from the caller's account.
    ///
    /// Overwrites any previous approval for the same spender.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);

        info!(owner = %owner, spender = %spender, amount = %amount, "token approval");
    }

    /// Moves tokens between accounts.
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
            return Ok(Transfer::new(from.clone(), to.clone(), amount));
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::AmountOverflow)?;

        self.balances.insert(from.clone(), debited);
        self.balances.insert(to.clone(), credited);

        debug!(from = %from, to = %to, amount = %amount, "token transfer");
        Ok(Transfer::new(from.clone(), to.clone(), amount))
    }

    /// Moves tokens on the owner's behalf, consuming the spender's allowance.
    ///
    /// Allowance, balance and the recipient's headroom are all validated
    /// before any write, so a failure leaves the ledger untouched.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InsufficientAllowance` if the spender's approval
    /// does not cover the amount, `TokenError::InsufficientBalance` if the
    /// owner cannot fund it, or `TokenError::AmountOverflow`.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<Transfer, TokenError> {
        let approved = self.allowance(owner, spender);
        let remaining = approved
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientAllowance {
                required: amount,
                approved,
            })?;

        let receipt = self.transfer(owner, to, amount)?;
        self.allowances
            .insert((owner.clone(), spender.clone()), remaining);

        debug!(
            spender = %spender,
            owner = %owner,
            to = %to,
            amount = %amount,
            "token transfer_from"
        );
        Ok(receipt)
    }
}
