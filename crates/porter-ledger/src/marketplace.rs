//! The shared ledger store.
//!
//! One [`Marketplace`] value owns every collection the operations touch:
//! orders, offers, the per-order offer index, invoices, reviews, per-identity
//! stats and the fee pool. It is initialized once at deployment and only ever
//! grows; callers hold identifiers, never references into it.

use std::collections::HashMap;

use porter_core::{Address, Amount};

use crate::error::LedgerError;
use crate::escrow::Invoice;
use crate::orderbook::{Offer, Order};
use crate::reputation::{Review, UserStat};

/// The escrow and reputation ledger for the delivery marketplace.
#[derive(Debug)]
pub struct Marketplace {
    /// The ledger's own account — where escrowed value and fees are held.
    pub(crate) address: Address,
    /// The only identity allowed to withdraw accrued fees.
    pub(crate) foundation: Address,
    pub(crate) orders: Vec<Order>,
    pub(crate) offers: Vec<Offer>,
    /// Offer ids indexed per order, parallel to `orders`.
    pub(crate) order_offers: Vec<Vec<u64>>,
    /// Invoice with id `n` lives at index `n - 1`; id 0 is the reserved
    /// "no invoice" sentinel and never resolves.
    pub(crate) invoices: Vec<Invoice>,
    /// Reviews keyed by (reviewed party, order id).
    pub(crate) reviews: HashMap<(Address, u64), Review>,
    pub(crate) stats: HashMap<Address, UserStat>,
    /// Accrued protocol fees, native currency only.
    pub(crate) fee_pool: Amount,
}

impl Marketplace {
    /// Creates an empty ledger owned by `address`, with `foundation` as the
    /// fee-withdrawal identity.
    #[must_use]
    pub fn new(address: Address, foundation: Address) -> Self {
        Self {
            address,
            foundation,
            orders: Vec::new(),
            offers: Vec::new(),
            order_offers: Vec::new(),
            invoices: Vec::new(),
            reviews: HashMap::new(),
            stats: HashMap::new(),
            fee_pool: Amount::ZERO,
        }
    }

    /// The ledger's own account address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The foundation identity.
    #[must_use]
    pub fn foundation(&self) -> &Address {
        &self.foundation
    }

    /// Accrued protocol fees (native currency).
    #[must_use]
    pub fn fees(&self) -> Amount {
        self.fee_pool
    }

    /// Looks up an order by id.
    pub fn order(&self, id: u64) -> Result<&Order, LedgerError> {
        self.orders
            .get(id as usize)
            .ok_or(LedgerError::NotFound { entity: "order", id })
    }

    pub(crate) fn order_mut(&mut self, id: u64) -> Result<&mut Order, LedgerError> {
        self.orders
            .get_mut(id as usize)
            .ok_or(LedgerError::NotFound { entity: "order", id })
    }

    /// Looks up an offer by its global id.
    pub fn offer(&self, id: u64) -> Result<&Offer, LedgerError> {
        self.offers
            .get(id as usize)
            .ok_or(LedgerError::NotFound { entity: "offer", id })
    }

    /// Looks up an invoice by id. Ids start at 1; 0 never denotes a real
    /// invoice.
    pub fn invoice(&self, id: u64) -> Result<&Invoice, LedgerError> {
        id.checked_sub(1)
            .and_then(|i| self.invoices.get(i as usize))
            .ok_or(LedgerError::NotFound {
                entity: "invoice",
                id,
            })
    }

    pub(crate) fn invoice_mut(&mut self, id: u64) -> Result<&mut Invoice, LedgerError> {
        id.checked_sub(1)
            .and_then(|i| self.invoices.get_mut(i as usize))
            .ok_or(LedgerError::NotFound {
                entity: "invoice",
                id,
            })
    }

    /// Number of orders in the ledger.
    #[must_use]
    pub fn orders_count(&self) -> u64 {
        self.orders.len() as u64
    }

    /// Number of offers across all orders.
    #[must_use]
    pub fn offers_count(&self) -> u64 {
        self.offers.len() as u64
    }

    /// Number of invoice records, counting the reserved empty slot at id 0.
    ///
    /// An empty ledger therefore reports 1, and the count is always the id
    /// the next invoice will receive.
    #[must_use]
    pub fn invoices_count(&self) -> u64 {
        self.invoices.len() as u64 + 1
    }

    /// Offer ids submitted against an order.
    pub fn order_offers(&self, order_id: u64) -> Result<&[u64], LedgerError> {
        self.order_offers
            .get(order_id as usize)
            .map(Vec::as_slice)
            .ok_or(LedgerError::NotFound {
                entity: "order",
                id: order_id,
            })
    }

    /// Number of offers submitted against an order.
    pub fn order_offers_count(&self, order_id: u64) -> Result<u64, LedgerError> {
        Ok(self.order_offers(order_id)?.len() as u64)
    }
}

/// Checks that `caller` is the `expected` party.
pub(crate) fn require_party(
    expected: &Address,
    caller: &Address,
    role: &str,
) -> Result<(), LedgerError> {
    if expected == caller {
        Ok(())
    } else {
        Err(LedgerError::Unauthorized(format!(
            "caller {caller} is not the {role}"
        )))
    }
}
