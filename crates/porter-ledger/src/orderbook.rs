//! Order book: delivery orders and carrier offers.
//!
//! Orders are created by customers and assigned dense 0-based ids. Carriers
//! respond with offers; offers get global dense ids and are additionally
//! indexed per order. Submitting an offer never mutates the order — the
//! binding step is issuing and paying an invoice (see [`crate::escrow`]).

use chrono::{DateTime, Utc};
use porter_core::Address;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::LedgerError;
use crate::marketplace::Marketplace;

/// Lifecycle of a delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Posted by the customer; no invoice paid yet.
    Created,
    /// An invoice was paid; the order is bound to its carrier.
    Assigned,
    /// Delivery proven and the escrowed deposit released.
    Fulfilled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Assigned => write!(f, "assigned"),
            Self::Fulfilled => write!(f, "fulfilled"),
        }
    }
}

/// A delivery order posted by a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Dense 0-based id.
    pub id: u64,
    /// The customer who posted the order. Immutable once set.
    pub customer: Address,
    /// Origin label.
    pub from_label: String,
    /// Destination label.
    pub to_label: String,
    /// Ordered waypoint sequence between origin and destination.
    pub route: Vec<String>,
    /// The order is not meant to be taken after this instant.
    pub valid_until: DateTime<Utc>,
    /// Free-form message for carriers.
    pub message: String,
    /// Set when an invoice is paid; `None` until then.
    pub carrier: Option<Address>,
    /// Most recently issued invoice for this order; 0 = none.
    pub invoice_id: u64,
    /// Current lifecycle state.
    pub status: OrderStatus,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order last changed.
    pub updated_at: DateTime<Utc>,
}

/// A carrier's offer on an order. One carrier may submit several offers on
/// the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    /// Dense 0-based id, global across all orders.
    pub id: u64,
    /// The order this offer responds to.
    pub order_id: u64,
    /// The carrier making the offer.
    pub carrier: Address,
    /// Free-form message (terms, pricing hints, ...).
    pub message: String,
    /// When the offer was submitted.
    pub created_at: DateTime<Utc>,
}

impl Marketplace {
    /// Posts a new delivery order for the caller.
    ///
    /// The order starts in `Created` with no carrier and no invoice. The new
    /// id is appended to the caller's per-identity order list.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` if the origin or destination label
    /// is empty.
    pub fn add_order(
        &mut self,
        caller: &Address,
        from: &str,
        to: &str,
        route: Vec<String>,
        valid_until: DateTime<Utc>,
        message: &str,
    ) -> Result<u64, LedgerError> {
        if from.trim().is_empty() || to.trim().is_empty() {
            return Err(LedgerError::Validation(
                "origin and destination labels must not be empty".into(),
            ));
        }

        let id = self.orders.len() as u64;
        let now = Utc::now();
        self.orders.push(Order {
            id,
            customer: caller.clone(),
            from_label: from.to_string(),
            to_label: to.to_string(),
            route,
            valid_until,
            message: message.to_string(),
            carrier: None,
            invoice_id: 0,
            status: OrderStatus::Created,
            created_at: now,
            updated_at: now,
        });
        self.order_offers.push(Vec::new());
        self.stats
            .entry(caller.clone())
            .or_default()
            .order_ids
            .push(id);

        info!(order_id = id, customer = %caller, "order created");
        Ok(id)
    }

    /// Submits a carrier offer against an existing order.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if the order does not exist.
    pub fn add_offer(
        &mut self,
        caller: &Address,
        order_id: u64,
        message: &str,
    ) -> Result<u64, LedgerError> {
        self.order(order_id)?;

        let id = self.offers.len() as u64;
        self.offers.push(Offer {
            id,
            order_id,
            carrier: caller.clone(),
            message: message.to_string(),
            created_at: Utc::now(),
        });
        self.order_offers[order_id as usize].push(id);

        info!(offer_id = id, order_id, carrier = %caller, "offer submitted");
        Ok(id)
    }
}
