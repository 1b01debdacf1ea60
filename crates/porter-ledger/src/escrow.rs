//! Invoice escrow: the payment state machine.
//!
//! Each invoice moves `Issued → Paid → {Fulfilled | Refunded}`, the last two
//! terminal. Paying escrows the deposit with the ledger; fulfillment releases
//! it to the carrier after an optional commit-reveal delivery proof; refund
//! returns value to the customer.
//!
//! Fee policy: native-currency invoices pay a 0.1% prepayment fee and a 1%
//! fulfillment fee, both computed on the deposit and credited to the fee
//! pool. Token invoices never accrue fees at any stage — a deliberate
//! incentive to settle in the platform token.

use chrono::{DateTime, Utc};
use porter_core::{Address, Amount};
use porter_token::{NativeBank, TokenLedger};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::LedgerError;
use crate::marketplace::{Marketplace, require_party};
use crate::orderbook::OrderStatus;

/// Prepayment fee withheld on native payment, in thousandths of the deposit.
pub const PREPAYMENT_FEE_PERMILLE: u64 = 1;

/// Fulfillment fee withheld on native settlement, in thousandths of the
/// deposit.
pub const FULFILLMENT_FEE_PERMILLE: u64 = 10;

/// The two supported settlement currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// The chain's native coin. Fees apply.
    Native,
    /// The platform token, pulled via allowance. Fee-exempt by policy.
    Token,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Token => write!(f, "token"),
        }
    }
}

/// The state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Issued by the carrier, awaiting payment.
    Issued,
    /// Funded by the customer; deposit held in escrow.
    Paid,
    /// Delivery proven; deposit released to the carrier (terminal).
    Fulfilled,
    /// Value returned to the customer (terminal).
    Refunded,
}

impl InvoiceStatus {
    /// Checks if a transition to the target state is valid.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        use InvoiceStatus::{Fulfilled, Issued, Paid, Refunded};

        matches!((self, target), (Issued, Paid) | (Paid, Fulfilled | Refunded))
    }

    /// Returns true if the invoice can no longer change state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Fulfilled | Self::Refunded)
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Issued => write!(f, "issued"),
            Self::Paid => write!(f, "paid"),
            Self::Fulfilled => write!(f, "fulfilled"),
            Self::Refunded => write!(f, "refunded"),
        }
    }
}

/// A commit-reveal delivery proof.
///
/// The customer commits the SHA-256 hash of a secret delivery code at payment
/// time and shares the code with the real recipient. The carrier can only
/// claim the escrowed deposit by producing the code at fulfillment time.
/// Absence of a commitment means no proof is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryProof([u8; 32]);

impl DeliveryProof {
    /// Commits to a secret delivery code.
    #[must_use]
    pub fn commit(secret: &str) -> Self {
        Self(Sha256::digest(secret.as_bytes()).into())
    }

    /// Checks a revealed code against the commitment, byte for byte.
    #[must_use]
    pub fn matches(&self, code: &str) -> bool {
        Self::commit(code).0 == self.0
    }

    /// The raw 32-byte commitment.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// A priced invoice issued by a carrier against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// 1-based id, globally unique; 0 is the reserved "no invoice" sentinel.
    pub id: u64,
    /// The order this invoice prices.
    pub order_id: u64,
    /// The carrier who issued the invoice and will perform the delivery.
    pub carrier: Address,
    /// Paid out to the carrier immediately on payment.
    pub prepayment: Amount,
    /// Held in escrow until fulfillment or refund.
    pub deposit: Amount,
    /// The invoice is not meant to be paid after this instant.
    pub valid_until: DateTime<Utc>,
    /// Settlement currency.
    pub currency: Currency,
    /// Optional commit-reveal delivery proof.
    pub deposit_proof: Option<DeliveryProof>,
    /// Current lifecycle state.
    pub status: InvoiceStatus,
    /// When the invoice was issued.
    pub created_at: DateTime<Utc>,
    /// When the invoice last changed.
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Prepayment plus deposit.
    pub fn total(&self) -> Result<Amount, LedgerError> {
        self.prepayment
            .checked_add(self.deposit)
            .ok_or_else(|| LedgerError::Validation("invoice total overflows".into()))
    }

    fn transition_to(&mut self, target: InvoiceStatus) -> Result<(), LedgerError> {
        if self.status.can_transition_to(target) {
            self.status = target;
            self.updated_at = Utc::now();
            Ok(())
        } else {
            Err(LedgerError::InvalidState(format!(
                "invoice {} cannot move from {} to {}",
                self.id, self.status, target
            )))
        }
    }
}

impl Marketplace {
    /// Issues an invoice against an order; the caller becomes its carrier.
    ///
    /// Sets `order.invoice_id` to the new id (overwriting any prior
    /// reference) without touching the order's status. The first real invoice
    /// id is 1.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if the order does not exist, or
    /// `LedgerError::Validation` if `prepayment + deposit` overflows.
    pub fn add_invoice(
        &mut self,
        caller: &Address,
        order_id: u64,
        prepayment: Amount,
        deposit: Amount,
        valid_until: DateTime<Utc>,
        currency: Currency,
        deposit_proof: Option<DeliveryProof>,
    ) -> Result<u64, LedgerError> {
        self.order(order_id)?;
        prepayment
            .checked_add(deposit)
            .ok_or_else(|| LedgerError::Validation("invoice total overflows".into()))?;

        let id = self.invoices.len() as u64 + 1;
        let now = Utc::now();
        self.invoices.push(Invoice {
            id,
            order_id,
            carrier: caller.clone(),
            prepayment,
            deposit,
            valid_until,
            currency,
            deposit_proof,
            status: InvoiceStatus::Issued,
            created_at: now,
            updated_at: now,
        });

        let order = self.order_mut(order_id)?;
        order.invoice_id = id;
        order.updated_at = now;

        info!(invoice_id = id, order_id, carrier = %caller, %currency, "invoice issued");
        Ok(id)
    }

    /// Funds an invoice. The caller must be the owning order's customer.
    ///
    /// Native invoices require `attached` to equal `prepayment + deposit`
    /// exactly; a 0.1% prepayment fee on the deposit is withheld from the
    /// carrier's prepayment and credited to the fee pool. Token invoices take
    /// no attached value; the ledger pulls the total from the customer via a
    /// prior allowance, fee-free.
    ///
    /// A `deposit_proof` supplied here becomes the invoice's delivery-proof
    /// commitment, overwriting one set at issue time.
    ///
    /// On success the invoice is `Paid`, the order is `Assigned` to the
    /// invoice's carrier, and `order.invoice_id` is pinned to this invoice.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown invoice, `Unauthorized` if the caller is not
    /// the customer, `InvalidState` if the invoice is not `Issued` or another
    /// invoice for the order was already paid, `InsufficientFunds` if the
    /// attached or approved value does not cover the requirement.
    pub fn pay(
        &mut self,
        native: &mut NativeBank,
        tokens: &mut TokenLedger,
        caller: &Address,
        invoice_id: u64,
        attached: Amount,
        deposit_proof: Option<DeliveryProof>,
    ) -> Result<(), LedgerError> {
        let invoice = self.invoice(invoice_id)?;
        let order_id = invoice.order_id;
        let carrier = invoice.carrier.clone();
        let prepayment = invoice.prepayment;
        let deposit = invoice.deposit;
        let currency = invoice.currency;
        let status = invoice.status;
        let total = invoice.total()?;

        let order = self.order(order_id)?;
        require_party(&order.customer, caller, "order customer")?;
        if status != InvoiceStatus::Issued {
            return Err(LedgerError::InvalidState(format!(
                "invoice {invoice_id} is {status}, only issued invoices can be paid"
            )));
        }
        if order.status != OrderStatus::Created {
            return Err(LedgerError::InvalidState(format!(
                "order {order_id} is {}, an invoice for it has already been paid",
                order.status
            )));
        }

        // Validate funds and fee arithmetic before any transfer
        let fee = match currency {
            Currency::Native => {
                if attached != total {
                    return Err(LedgerError::InsufficientFunds {
                        required: total,
                        available: attached,
                    });
                }
                let available = native.balance_of(caller);
                if available < attached {
                    return Err(LedgerError::InsufficientFunds {
                        required: attached,
                        available,
                    });
                }
                deposit.permille(PREPAYMENT_FEE_PERMILLE)
            }
            Currency::Token => {
                if !attached.is_zero() {
                    return Err(LedgerError::Validation(
                        "token invoices take no attached value".into(),
                    ));
                }
                let approved = tokens.allowance(caller, &self.address);
                if approved < total {
                    return Err(LedgerError::InsufficientFunds {
                        required: total,
                        available: approved,
                    });
                }
                let available = tokens.balance_of(caller);
                if available < total {
                    return Err(LedgerError::InsufficientFunds {
                        required: total,
                        available,
                    });
                }
                Amount::ZERO
            }
        };
        let payout = prepayment.checked_sub(fee).ok_or_else(|| {
            LedgerError::Validation("prepayment does not cover the prepayment fee".into())
        })?;
        let new_pool = self
            .fee_pool
            .checked_add(fee)
            .ok_or_else(|| LedgerError::Validation("fee pool overflows".into()))?;
        // The payout leg runs second; its headroom must be known good before
        // the first transfer moves anything, or a late failure would strand
        // the customer's value on the ledger
        let carrier_headroom = match currency {
            Currency::Native => native.balance_of(&carrier).checked_add(payout),
            Currency::Token => tokens.balance_of(&carrier).checked_add(payout),
        };
        if carrier_headroom.is_none() {
            return Err(LedgerError::Validation(
                "carrier balance would overflow".into(),
            ));
        }

        let ledger = self.address.clone();
        match currency {
            Currency::Native => {
                // Attach, then forward the prepayment net of the fee; the
                // deposit and the fee stay on the ledger's account
                native.transfer(caller, &ledger, attached)?;
                native.transfer(&ledger, &carrier, payout)?;
            }
            Currency::Token => {
                tokens.transfer_from(&ledger, caller, &ledger, total)?;
                tokens.transfer(&ledger, &carrier, payout)?;
            }
        }
        self.fee_pool = new_pool;

        let invoice = self.invoice_mut(invoice_id)?;
        if let Some(proof) = deposit_proof {
            invoice.deposit_proof = Some(proof);
        }
        invoice.transition_to(InvoiceStatus::Paid)?;

        let now = Utc::now();
        let order = self.order_mut(order_id)?;
        order.status = OrderStatus::Assigned;
        order.carrier = Some(carrier.clone());
        order.invoice_id = invoice_id;
        order.updated_at = now;

        info!(
            invoice_id,
            order_id,
            %currency,
            total = %total,
            fee = %fee,
            carrier = %carrier,
            "invoice paid, deposit escrowed"
        );
        Ok(())
    }

    /// Claims the escrowed deposit after delivery. The caller must be the
    /// order's carrier.
    ///
    /// If the paid invoice carries a delivery-proof commitment, the supplied
    /// code's hash must match it exactly. A 1% fulfillment fee on the deposit
    /// is withheld for native invoices; token invoices settle fee-free.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown order, `Unauthorized` if the caller is not
    /// the carrier or the delivery code is wrong, `InvalidState` if the
    /// pinned invoice is not `Paid`.
    pub fn fulfill(
        &mut self,
        native: &mut NativeBank,
        tokens: &mut TokenLedger,
        caller: &Address,
        order_id: u64,
        delivery_code: Option<&str>,
    ) -> Result<(), LedgerError> {
        let order = self.order(order_id)?;
        let carrier = order
            .carrier
            .clone()
            .ok_or_else(|| LedgerError::Unauthorized(format!("order {order_id} has no carrier")))?;
        require_party(&carrier, caller, "order carrier")?;

        let invoice_id = order.invoice_id;
        let invoice = self.invoice(invoice_id)?;
        if invoice.status != InvoiceStatus::Paid {
            return Err(LedgerError::InvalidState(format!(
                "invoice {invoice_id} is {}, only paid invoices can be fulfilled",
                invoice.status
            )));
        }
        if let Some(commitment) = &invoice.deposit_proof {
            let revealed = delivery_code.is_some_and(|code| commitment.matches(code));
            if !revealed {
                return Err(LedgerError::Unauthorized("wrong delivery code".into()));
            }
        }

        let deposit = invoice.deposit;
        let currency = invoice.currency;
        let fee = match currency {
            Currency::Native => deposit.permille(FULFILLMENT_FEE_PERMILLE),
            Currency::Token => Amount::ZERO,
        };
        // permille(10) can never exceed the deposit itself
        let payout = deposit.checked_sub(fee).ok_or_else(|| {
            LedgerError::Validation("deposit does not cover the fulfillment fee".into())
        })?;
        let new_pool = self
            .fee_pool
            .checked_add(fee)
            .ok_or_else(|| LedgerError::Validation("fee pool overflows".into()))?;

        let ledger = self.address.clone();
        match currency {
            Currency::Native => {
                native.transfer(&ledger, &carrier, payout)?;
            }
            Currency::Token => {
                tokens.transfer(&ledger, &carrier, payout)?;
            }
        }
        self.fee_pool = new_pool;

        self.invoice_mut(invoice_id)?
            .transition_to(InvoiceStatus::Fulfilled)?;
        let order = self.order_mut(order_id)?;
        order.status = OrderStatus::Fulfilled;
        order.updated_at = Utc::now();

        info!(
            invoice_id,
            order_id,
            %currency,
            payout = %payout,
            fee = %fee,
            "delivery fulfilled, deposit released"
        );
        Ok(())
    }

    /// Returns value to the customer. The caller must be the invoice's
    /// carrier and the invoice must be `Paid` — refunding a fulfilled
    /// invoice is an invalid state, not a no-op.
    ///
    /// Native: the carrier attaches exactly `prepayment + deposit`, forwarded
    /// entirely to the customer. Token: the ledger pulls the same total back
    /// from the carrier via a prior allowance. No fee either way. The order
    /// keeps its `Assigned` status; only the invoice moves to `Refunded`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown invoice, `Unauthorized` if the caller is not
    /// the carrier, `InvalidState` if the invoice is not `Paid`,
    /// `InsufficientFunds` on attached/approved value mismatch.
    pub fn refund(
        &mut self,
        native: &mut NativeBank,
        tokens: &mut TokenLedger,
        caller: &Address,
        invoice_id: u64,
        attached: Amount,
    ) -> Result<(), LedgerError> {
        let invoice = self.invoice(invoice_id)?;
        require_party(&invoice.carrier, caller, "invoice carrier")?;
        if invoice.status != InvoiceStatus::Paid {
            return Err(LedgerError::InvalidState(format!(
                "invoice {invoice_id} is {}, only paid invoices can be refunded",
                invoice.status
            )));
        }

        let order_id = invoice.order_id;
        let currency = invoice.currency;
        let total = invoice.total()?;
        let customer = self.order(order_id)?.customer.clone();

        match currency {
            Currency::Native => {
                if attached != total {
                    return Err(LedgerError::InsufficientFunds {
                        required: total,
                        available: attached,
                    });
                }
                native.transfer(caller, &customer, attached)?;
            }
            Currency::Token => {
                if !attached.is_zero() {
                    return Err(LedgerError::Validation(
                        "token refunds take no attached value".into(),
                    ));
                }
                let ledger = self.address.clone();
                tokens.transfer_from(&ledger, caller, &customer, total)?;
            }
        }

        self.invoice_mut(invoice_id)?
            .transition_to(InvoiceStatus::Refunded)?;

        info!(
            invoice_id,
            order_id,
            %currency,
            total = %total,
            customer = %customer,
            "invoice refunded"
        );
        Ok(())
    }

    /// Pays the entire fee pool out to the foundation and resets it to zero.
    /// Returns the amount withdrawn.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Unauthorized` if the caller is not the
    /// foundation identity.
    pub fn withdraw_fees(
        &mut self,
        native: &mut NativeBank,
        caller: &Address,
    ) -> Result<Amount, LedgerError> {
        require_party(&self.foundation, caller, "foundation")?;

        let amount = self.fee_pool;
        if !amount.is_zero() {
            let ledger = self.address.clone();
            native.transfer(&ledger, caller, amount)?;
        }
        self.fee_pool = Amount::ZERO;

        info!(amount = %amount, "fee pool withdrawn");
        Ok(amount)
    }
}
