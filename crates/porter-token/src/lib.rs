//! # porter-token
//!
//! Settlement value sources for the Porter marketplace ledger.
//!
//! The ledger settles invoices in one of two currencies. This crate models
//! both as in-process account books the ledger is a client of:
//!
//! - [`NativeBank`] — balances in the native coin; operations that require
//!   attached value debit the caller here
//! - [`TokenLedger`] — the platform token with the usual fungible-token
//!   surface (`balance_of` / `approve` / `transfer_from`)
//!
//! Every successful movement returns a [`Transfer`] receipt.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod native;
pub mod token;
pub mod transfer;

pub use error::TokenError;
pub use native::NativeBank;
pub use token::TokenLedger;
pub use transfer::{Transfer, TransferId};
