//! # porter-core
//!
//! Shared primitives for the Porter P2P delivery marketplace ledger.
//!
//! This crate provides:
//!
//! - [`Amount`] — Fixed-point value with 9 decimal places, used for both
//!   settlement currencies
//! - [`Address`] — Opaque caller identity (base58-encoded 32 bytes)
//! - [`Wallet`] — Ed25519 keypair from which an [`Address`] is derived

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod error;
pub mod identity;

pub use amount::Amount;
pub use error::CoreError;
pub use identity::{Address, Wallet};
