//! Reservation engine: the only writer of inventory records.
//!
//! Two concurrency disciplines, chosen per operation:
//!
//! - `add_stock` reads without a lock and saves optimistically, retrying once
//!   after a short delay when a concurrent writer got there first
//! - `reserve_stock` and `release_reservation` read with a row-exclusive lock
//!   so the check-then-increment is serialized per SKU

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use logiflow_core::Sku;
use logiflow_inventory::InventoryRecord;

use crate::error::ServiceError;
use crate::store::{StockStore, StockTx};

const ADD_STOCK_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Requested stock adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub sku: Sku,
    pub quantity: i64,
    pub direction: AdjustmentDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdjustmentDirection {
    Add,
    Remove,
}

/// Reserve `amount` units of `sku` inside an already-open unit of work.
///
/// Used by the order coordinator to reserve several lines atomically. The row
/// lock taken here is held until the unit of work ends.
pub async fn reserve_stock_in<T: StockTx>(
    tx: &mut T,
    sku: &Sku,
    amount: i64,
) -> Result<(), ServiceError> {
    let mut record = tx
        .find_by_sku_for_update(sku)
        .await?
        .ok_or_else(|| ServiceError::NotFound { sku: sku.clone() })?;
    record.reserve(amount)?;
    tx.save(record).await?;
    Ok(())
}

/// Stock operations over a record store.
#[derive(Debug, Clone)]
pub struct ReservationEngine<S> {
    store: S,
}

impl<S: StockStore> ReservationEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Units available to promise for `sku` (quantity minus reserved).
    pub async fn get_available(&self, sku: &Sku) -> Result<i64, ServiceError> {
        let mut tx = self.store.begin().await?;
        let record = tx
            .find_by_sku(sku)
            .await?
            .ok_or_else(|| ServiceError::NotFound { sku: sku.clone() })?;
        Ok(record.available())
    }

    /// Add `amount` units, creating the record when the SKU is unknown.
    ///
    /// Optimistic: a write conflict from a concurrent adder is retried once
    /// after a short delay, then surfaced.
    #[instrument(skip(self), fields(sku = %sku))]
    pub async fn add_stock(&self, sku: &Sku, amount: i64) -> Result<(), ServiceError> {
        match self.try_add_stock(sku, amount).await {
            Err(ServiceError::Conflict(reason)) => {
                warn!(%sku, reason, "write conflict adding stock, retrying once");
                tokio::time::sleep(ADD_STOCK_RETRY_DELAY).await;
                self.try_add_stock(sku, amount).await
            }
            other => other,
        }
    }

    async fn try_add_stock(&self, sku: &Sku, amount: i64) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let record = match tx.find_by_sku(sku).await? {
            Some(mut record) => {
                record.receive(amount)?;
                record
            }
            None => InventoryRecord::new(sku.clone(), amount)?,
        };
        tx.save(record).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Reserve `amount` units of `sku`, serialized per SKU by a row lock.
    #[instrument(skip(self), fields(sku = %sku))]
    pub async fn reserve_stock(&self, sku: &Sku, amount: i64) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        reserve_stock_in(&mut tx, sku, amount).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Release up to `amount` previously reserved units. Releasing more than
    /// is reserved clamps at zero.
    #[instrument(skip(self), fields(sku = %sku))]
    pub async fn release_reservation(&self, sku: &Sku, amount: i64) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let mut record = tx
            .find_by_sku_for_update(sku)
            .await?
            .ok_or_else(|| ServiceError::NotFound { sku: sku.clone() })?;
        record.release(amount)?;
        tx.save(record).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Move a record to a new SKU, keeping its counts and version.
    #[instrument(skip(self), fields(old = %old_sku, new = %new_sku))]
    pub async fn rename_sku(&self, old_sku: &Sku, new_sku: &Sku) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        if tx.find_by_sku(old_sku).await?.is_none() {
            return Err(ServiceError::NotFound {
                sku: old_sku.clone(),
            });
        }
        tx.rename(old_sku, new_sku).await?;
        tx.commit().await?;
        info!(%old_sku, %new_sku, "updated inventory SKU");
        Ok(())
    }

    /// Create a zero-stock record for a newly registered product.
    ///
    /// Idempotent: an existing record is left untouched, whatever its counts.
    #[instrument(skip(self), fields(sku = %sku))]
    pub async fn initialize_inventory(&self, sku: &Sku) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        if tx.find_by_sku(sku).await?.is_some() {
            info!(%sku, "inventory already exists for SKU");
            return Ok(());
        }
        tx.save(InventoryRecord::new(sku.clone(), 0)?).await?;
        tx.commit().await?;
        info!(%sku, "initialized inventory for SKU");
        Ok(())
    }

    /// Apply a signed adjustment: `Add` receives stock, `Remove` reserves it.
    pub async fn adjust_stock(&self, adjustment: &StockAdjustment) -> Result<(), ServiceError> {
        if adjustment.quantity < 1 {
            return Err(ServiceError::Validation(format!(
                "adjustment quantity must be at least 1, got {}",
                adjustment.quantity
            )));
        }
        match adjustment.direction {
            AdjustmentDirection::Add => self.add_stock(&adjustment.sku, adjustment.quantity).await,
            AdjustmentDirection::Remove => {
                self.reserve_stock(&adjustment.sku, adjustment.quantity).await
            }
        }
    }
}
