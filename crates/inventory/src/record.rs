use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use logiflow_core::{DomainError, DomainResult, Sku};

/// Stock levels for one SKU.
///
/// The record is the only shared mutable resource in the reservation core.
/// Every transition below is pure and preserves `0 <= reserved <= quantity`;
/// the store bumps `version`/`last_updated` when a transition is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    sku: Sku,
    quantity: i64,
    reserved: i64,
    version: u64,
    last_updated: DateTime<Utc>,
}

impl InventoryRecord {
    /// Create a record that has not been persisted yet (`version` 0).
    pub fn new(sku: Sku, quantity: i64) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(Self {
            sku,
            quantity,
            reserved: 0,
            version: 0,
            last_updated: Utc::now(),
        })
    }

    /// Rebuild a record from stored fields. Used by store implementations.
    pub fn from_stored(
        sku: Sku,
        quantity: i64,
        reserved: i64,
        version: u64,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            sku,
            quantity,
            reserved,
            version,
            last_updated,
        }
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    /// Optimistic-concurrency token. 0 means "never persisted".
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Units not yet committed to open orders.
    pub fn available(&self) -> i64 {
        self.quantity - self.reserved
    }

    /// Increase on-hand quantity (replenishment).
    pub fn receive(&mut self, amount: i64) -> DomainResult<()> {
        if amount < 0 {
            return Err(DomainError::validation("amount cannot be negative"));
        }
        self.quantity += amount;
        Ok(())
    }

    /// Commit `amount` units to an open order if available stock covers it.
    ///
    /// On `InsufficientStock` the record is left unchanged.
    pub fn reserve(&mut self, amount: i64) -> DomainResult<()> {
        if amount < 0 {
            return Err(DomainError::validation("amount cannot be negative"));
        }
        if self.available() < amount {
            return Err(DomainError::InsufficientStock {
                sku: self.sku.clone(),
                requested: amount,
                available: self.available(),
            });
        }
        self.reserved += amount;
        Ok(())
    }

    /// Undo a reservation, clamped so `reserved` never goes below zero.
    pub fn release(&mut self, amount: i64) -> DomainResult<()> {
        if amount < 0 {
            return Err(DomainError::validation("amount cannot be negative"));
        }
        self.reserved = (self.reserved - amount).max(0);
        Ok(())
    }

    /// Move the record's identity to a new SKU. Counts and version carry over.
    pub fn rename(&mut self, new_sku: Sku) {
        self.sku = new_sku;
    }

    /// Store-side bookkeeping after a successful write.
    pub fn mark_committed(&mut self, version: u64, last_updated: DateTime<Utc>) {
        self.version = version;
        self.last_updated = last_updated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quantity: i64) -> InventoryRecord {
        InventoryRecord::new(Sku::new("SKU-001").unwrap(), quantity).unwrap()
    }

    #[test]
    fn new_record_starts_unreserved() {
        let r = record(100);
        assert_eq!(r.quantity(), 100);
        assert_eq!(r.reserved(), 0);
        assert_eq!(r.available(), 100);
        assert_eq!(r.version(), 0);
    }

    #[test]
    fn new_record_rejects_negative_quantity() {
        assert!(InventoryRecord::new(Sku::new("SKU-001").unwrap(), -1).is_err());
    }

    #[test]
    fn receive_increases_quantity_only() {
        let mut r = record(10);
        r.reserve(4).unwrap();
        r.receive(5).unwrap();
        assert_eq!(r.quantity(), 15);
        assert_eq!(r.reserved(), 4);
        assert_eq!(r.available(), 11);
    }

    #[test]
    fn receive_zero_is_a_no_op() {
        let mut r = record(10);
        r.receive(0).unwrap();
        assert_eq!(r.quantity(), 10);
    }

    #[test]
    fn reserve_up_to_exact_availability() {
        let mut r = record(10);
        r.reserve(10).unwrap();
        assert_eq!(r.reserved(), 10);
        assert_eq!(r.available(), 0);

        let err = r.reserve(1).unwrap_err();
        match err {
            DomainError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 1);
                assert_eq!(available, 0);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        // Failed reservation left the record untouched.
        assert_eq!(r.reserved(), 10);
    }

    #[test]
    fn reserve_accounts_for_prior_reservations() {
        let mut r = record(100);
        r.reserve(10).unwrap();
        assert!(r.reserve(91).is_err());
        assert!(r.reserve(90).is_ok());
        assert_eq!(r.reserved(), 100);
    }

    #[test]
    fn release_clamps_at_zero() {
        let mut r = record(10);
        r.reserve(3).unwrap();
        r.release(5).unwrap();
        assert_eq!(r.reserved(), 0);
        assert_eq!(r.available(), 10);
    }

    #[test]
    fn rename_preserves_counts_and_version() {
        let mut r = record(5);
        r.reserve(2).unwrap();
        r.mark_committed(3, Utc::now());
        r.rename(Sku::new("SKU-002").unwrap());
        assert_eq!(r.sku().as_str(), "SKU-002");
        assert_eq!(r.quantity(), 5);
        assert_eq!(r.reserved(), 2);
        assert_eq!(r.version(), 3);
    }

    #[test]
    fn negative_amounts_are_rejected_everywhere() {
        let mut r = record(10);
        assert!(r.receive(-1).is_err());
        assert!(r.reserve(-1).is_err());
        assert!(r.release(-1).is_err());
    }

    mod invariant {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Receive(i64),
            Reserve(i64),
            Release(i64),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0i64..1000).prop_map(Op::Receive),
                (0i64..1000).prop_map(Op::Reserve),
                (0i64..1000).prop_map(Op::Release),
            ]
        }

        proptest! {
            #[test]
            fn reserved_never_exceeds_quantity(
                initial in 0i64..1000,
                ops in proptest::collection::vec(op_strategy(), 0..64),
            ) {
                let mut r = InventoryRecord::new(Sku::new("PROP-001").unwrap(), initial).unwrap();
                for op in ops {
                    // Individual ops may fail (insufficient stock); the
                    // invariant must hold after every outcome.
                    let _ = match op {
                        Op::Receive(n) => r.receive(n),
                        Op::Reserve(n) => r.reserve(n),
                        Op::Release(n) => r.release(n),
                    };
                    prop_assert!(r.reserved() >= 0);
                    prop_assert!(r.reserved() <= r.quantity());
                }
            }
        }
    }
}
