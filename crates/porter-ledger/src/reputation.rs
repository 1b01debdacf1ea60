//! Reputation: reviews and per-identity rating statistics.
//!
//! After an order is settled, either party may leave exactly one review.
//! The rating is always attributed to the *other* party of the order — the
//! reviewer's own stats never move. Stats also carry the append-only list of
//! orders an identity has posted.

use chrono::{DateTime, Utc};
use porter_core::Address;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::LedgerError;
use crate::marketplace::Marketplace;

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

/// A review left by one order party about the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Rating in `[1, 5]`.
    pub rating: u8,
    /// Free-form review text.
    pub text: String,
    /// When the review was recorded.
    pub created_at: DateTime<Utc>,
}

/// Aggregated statistics for one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStat {
    /// Orders posted by this identity, in creation order. Append-only.
    pub order_ids: Vec<u64>,
    /// Sum of all ratings received.
    pub rating_sum: u64,
    /// Number of ratings received.
    pub rating_count: u64,
}

impl UserStat {
    /// Number of orders this identity has posted.
    #[must_use]
    pub fn orders_count(&self) -> u64 {
        self.order_ids.len() as u64
    }

    /// Mean received rating, if any ratings were received.
    #[must_use]
    pub fn average_rating(&self) -> Option<f64> {
        if self.rating_count == 0 {
            None
        } else {
            Some(self.rating_sum as f64 / self.rating_count as f64)
        }
    }
}

impl Marketplace {
    /// Records a review for an order. The caller must be one of the order's
    /// two parties; the review and rating are attributed to the other one.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown order, `Unauthorized` if the caller is
    /// neither the customer nor the carrier, `Validation` for an out-of-range
    /// rating or empty text, `InvalidState` if the order has no counterparty
    /// yet or the caller already reviewed it.
    pub fn add_review(
        &mut self,
        caller: &Address,
        order_id: u64,
        rating: u8,
        text: &str,
    ) -> Result<(), LedgerError> {
        let order = self.order(order_id)?;
        let customer = order.customer.clone();
        let carrier = order.carrier.clone();

        let reviewed = if caller == &customer {
            carrier.ok_or_else(|| {
                LedgerError::InvalidState(format!("order {order_id} has no carrier to review"))
            })?
        } else if carrier.as_ref() == Some(caller) {
            customer
        } else {
            return Err(LedgerError::Unauthorized(format!(
                "caller {caller} is neither the customer nor the carrier of order {order_id}"
            )));
        };

        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(LedgerError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
            )));
        }
        if text.trim().is_empty() {
            return Err(LedgerError::Validation(
                "review text must not be empty".into(),
            ));
        }

        let key = (reviewed.clone(), order_id);
        if self.reviews.contains_key(&key) {
            return Err(LedgerError::InvalidState(format!(
                "order {order_id} was already reviewed by this party"
            )));
        }

        self.reviews.insert(
            key,
            Review {
                rating,
                text: text.to_string(),
                created_at: Utc::now(),
            },
        );
        let stat = self.stats.entry(reviewed.clone()).or_default();
        stat.rating_sum += u64::from(rating);
        stat.rating_count += 1;

        info!(order_id, reviewer = %caller, reviewed = %reviewed, rating, "review recorded");
        Ok(())
    }

    /// Aggregated stats for an identity. Unknown identities read as all
    /// zeros — the stat map is open, not an error.
    #[must_use]
    pub fn stat(&self, identity: &Address) -> UserStat {
        self.stats.get(identity).cloned().unwrap_or_default()
    }

    /// The `index`-th order posted by an identity.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if the index is out of range.
    pub fn user_order(&self, identity: &Address, index: u64) -> Result<u64, LedgerError> {
        self.stats
            .get(identity)
            .and_then(|s| s.order_ids.get(index as usize))
            .copied()
            .ok_or(LedgerError::NotFound {
                entity: "user order",
                id: index,
            })
    }

    /// The review recorded *about* an identity for an order.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if no such review exists.
    pub fn review(&self, identity: &Address, order_id: u64) -> Result<&Review, LedgerError> {
        self.reviews
            .get(&(identity.clone(), order_id))
            .ok_or(LedgerError::NotFound {
                entity: "review",
                id: order_id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::Currency;
    use porter_core::{Amount, Wallet};
    use porter_token::{NativeBank, TokenLedger};
    use test_case::test_case;

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    struct Harness {
        market: Marketplace,
        customer: Address,
        carrier: Address,
        order_id: u64,
    }

    /// An order paid and assigned to the carrier, ready for review.
    fn assigned_order() -> Harness {
        let mut market = Marketplace::new(
            Wallet::generate().address().clone(),
            Wallet::generate().address().clone(),
        );
        let mut native = NativeBank::new();
        let mut tokens = TokenLedger::new();
        let customer = Wallet::generate().address().clone();
        let carrier = Wallet::generate().address().clone();

        let order_id = market
            .add_order(
                &customer,
                "Lisbon",
                "Porto",
                vec![],
                Utc::now() + chrono::Duration::days(7),
                "parcel",
            )
            .unwrap();
        let invoice_id = market
            .add_invoice(
                &carrier,
                order_id,
                amt("0.3"),
                amt("3"),
                Utc::now() + chrono::Duration::days(7),
                Currency::Native,
                None,
            )
            .unwrap();
        native.mint(&customer, amt("3.3")).unwrap();
        market
            .pay(&mut native, &mut tokens, &customer, invoice_id, amt("3.3"), None)
            .unwrap();

        Harness {
            market,
            customer,
            carrier,
            order_id,
        }
    }

    #[test_case(0; "zero")]
    #[test_case(6; "just above range")]
    #[test_case(10; "ten")]
    fn out_of_range_ratings_are_rejected(rating: u8) {
        let mut h = assigned_order();
        let result = h
            .market
            .add_review(&h.customer.clone(), h.order_id, rating, "fine");
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test_case(1)]
    #[test_case(3)]
    #[test_case(5)]
    fn in_range_ratings_are_accepted(rating: u8) {
        let mut h = assigned_order();
        h.market
            .add_review(&h.customer.clone(), h.order_id, rating, "fine")
            .unwrap();
    }

    #[test]
    fn strangers_cannot_review() {
        let mut h = assigned_order();
        let stranger = Wallet::generate().address().clone();
        let result = h.market.add_review(&stranger, h.order_id, 5, "great");
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));
    }

    #[test]
    fn empty_text_is_rejected() {
        let mut h = assigned_order();
        let result = h.market.add_review(&h.customer.clone(), h.order_id, 5, "  ");
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn review_credits_the_other_party() {
        let mut h = assigned_order();
        h.market
            .add_review(&h.customer.clone(), h.order_id, 4, "quick and careful")
            .unwrap();

        let carrier_stat = h.market.stat(&h.carrier);
        assert_eq!(carrier_stat.rating_sum, 4);
        assert_eq!(carrier_stat.rating_count, 1);
        assert_eq!(carrier_stat.average_rating(), Some(4.0));

        // The reviewer's own rating stats never move
        let customer_stat = h.market.stat(&h.customer);
        assert_eq!(customer_stat.rating_sum, 0);
        assert_eq!(customer_stat.rating_count, 0);

        let review = h.market.review(&h.carrier, h.order_id).unwrap();
        assert_eq!(review.rating, 4);
        assert_eq!(review.text, "quick and careful");
    }

    #[test]
    fn both_parties_may_review_once_each() {
        let mut h = assigned_order();
        h.market
            .add_review(&h.customer.clone(), h.order_id, 5, "great carrier")
            .unwrap();
        h.market
            .add_review(&h.carrier.clone(), h.order_id, 3, "slow to hand over")
            .unwrap();

        assert_eq!(h.market.stat(&h.carrier).rating_count, 1);
        assert_eq!(h.market.stat(&h.customer).rating_count, 1);
        assert_eq!(h.market.review(&h.customer, h.order_id).unwrap().rating, 3);
    }

    #[test]
    fn re_rating_is_rejected() {
        let mut h = assigned_order();
        h.market
            .add_review(&h.customer.clone(), h.order_id, 5, "great")
            .unwrap();

        let result = h
            .market
            .add_review(&h.customer.clone(), h.order_id, 1, "changed my mind");
        assert!(matches!(result, Err(LedgerError::InvalidState(_))));
        assert_eq!(h.market.stat(&h.carrier).rating_count, 1);
        assert_eq!(h.market.stat(&h.carrier).rating_sum, 5);
    }

    #[test]
    fn reviewing_an_unassigned_order_fails() {
        let mut market = Marketplace::new(
            Wallet::generate().address().clone(),
            Wallet::generate().address().clone(),
        );
        let customer = Wallet::generate().address().clone();
        let order_id = market
            .add_order(
                &customer,
                "Lisbon",
                "Porto",
                vec![],
                Utc::now(),
                "parcel",
            )
            .unwrap();

        let result = market.add_review(&customer, order_id, 5, "nobody to rate");
        assert!(matches!(result, Err(LedgerError::InvalidState(_))));
    }

    #[test]
    fn review_of_unknown_order_is_not_found() {
        let mut h = assigned_order();
        let result = h.market.add_review(&h.customer.clone(), 99, 5, "??");
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn unknown_identity_reads_as_zero_stats() {
        let h = assigned_order();
        let nobody = Wallet::generate().address().clone();
        assert_eq!(h.market.stat(&nobody), UserStat::default());
        assert!(matches!(
            h.market.user_order(&nobody, 0),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn user_orders_are_index_addressable() {
        let mut h = assigned_order();
        let second = h
            .market
            .add_order(
                &h.customer.clone(),
                "Porto",
                "Braga",
                vec![],
                Utc::now(),
                "another one",
            )
            .unwrap();

        assert_eq!(h.market.user_order(&h.customer, 0).unwrap(), h.order_id);
        assert_eq!(h.market.user_order(&h.customer, 1).unwrap(), second);
        assert!(matches!(
            h.market.user_order(&h.customer, 2),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn missing_review_is_not_found() {
        let h = assigned_order();
        assert!(matches!(
            h.market.review(&h.carrier, h.order_id),
            Err(LedgerError::NotFound { .. })
        ));
    }
}
