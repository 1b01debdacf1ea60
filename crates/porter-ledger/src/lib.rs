//! # porter-ledger
//!
//! Escrow and reputation ledger underlying the Porter P2P delivery
//! marketplace. Customers post delivery orders, carriers submit offers and
//! priced invoices, customers fund an invoice in one of two settlement
//! currencies, carriers prove delivery to claim the escrowed deposit, and
//! both parties rate each other afterward.
//!
//! This crate provides:
//!
//! - [`Marketplace`] — the authoritative, append-growing store of orders,
//!   offers, invoices, reviews and per-identity stats
//! - Order book operations (orders, offers, per-order offer index)
//! - The invoice escrow state machine (Issued → Paid → Fulfilled/Refunded)
//!   with dual-currency fee accounting and a commit-reveal delivery proof
//! - Reputation operations (one review per order and reviewer, aggregated
//!   per-identity rating stats)
//!
//! The execution substrate is an external collaborator: it totally orders
//! operations and authenticates callers, so every operation here is a
//! synchronous `&mut` method taking the caller's [`porter_core::Address`]
//! explicitly. Every operation is all-or-nothing — all preconditions are
//! validated before the first mutation or value transfer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod escrow;
pub mod marketplace;
pub mod orderbook;
pub mod reputation;

pub use error::LedgerError;
pub use escrow::{
    Currency, DeliveryProof, FULFILLMENT_FEE_PERMILLE, Invoice, InvoiceStatus,
    PREPAYMENT_FEE_PERMILLE,
};
pub use marketplace::Marketplace;
pub use orderbook::{Offer, Order, OrderStatus};
pub use reputation::{MAX_RATING, MIN_RATING, Review, UserStat};
