//! Inventory record store contract.
//!
//! The store exposes the two write disciplines the reservation core needs,
//! as distinct operations rather than one generic save:
//!
//! - **Optimistic**: `find_by_sku` + `save`. The save fails with
//!   [`StoreError::Conflict`] when the record's version no longer matches the
//!   stored one, or when a racing create already inserted the SKU.
//! - **Exclusive**: `find_by_sku_for_update` takes a row lock held until the
//!   unit of work ends; a subsequent `save` of that row is unconditional.
//!
//! A [`StockTx`] is one atomic unit of work. Dropping it without `commit`
//! discards every staged write and releases every row lock.

use async_trait::async_trait;
use thiserror::Error;

use logiflow_core::Sku;
use logiflow_inventory::InventoryRecord;
use logiflow_orders::Order;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStockStore;
pub use postgres::PostgresStockStore;

/// Storage-level failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic version mismatch or uniqueness violation from a racing
    /// create. Transient; retrying the whole read-modify-write may succeed.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// A row-lock wait exceeded the configured timeout. Retryable; never a
    /// statement about stock levels.
    #[error("timed out waiting for row lock: {0}")]
    LockTimeout(String),

    /// Backend failure (connection, IO, unexpected data).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// One atomic unit of work against the record store.
#[async_trait]
pub trait StockTx: Send {
    /// Non-locking read. Sees this unit of work's own staged writes.
    async fn find_by_sku(&mut self, sku: &Sku) -> Result<Option<InventoryRecord>, StoreError>;

    /// Row-exclusive read. Blocks concurrent exclusive readers and writers of
    /// the *same* SKU until this unit of work ends; other SKUs are unaffected.
    async fn find_by_sku_for_update(
        &mut self,
        sku: &Sku,
    ) -> Result<Option<InventoryRecord>, StoreError>;

    /// Stage a write of the record.
    ///
    /// Optimistic unless this unit of work holds the row's exclusive lock.
    /// A record with version 0 is a create and conflicts with any existing row.
    async fn save(&mut self, record: InventoryRecord) -> Result<(), StoreError>;

    /// Move a record's identity to a new SKU, preserving counts and version.
    async fn rename(&mut self, old_sku: &Sku, new_sku: &Sku) -> Result<(), StoreError>;

    /// Persist an order aggregate and its items.
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;

    /// Atomically apply every staged write and release all row locks.
    async fn commit(self) -> Result<(), StoreError>;
}

/// Factory for units of work.
#[async_trait]
pub trait StockStore: Send + Sync {
    type Tx: StockTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}
