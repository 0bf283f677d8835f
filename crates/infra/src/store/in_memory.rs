//! In-memory record store for tests/dev.
//!
//! Reproduces the semantics of the Postgres store: per-SKU row locks with a
//! bounded wait, optimistic version checks at commit, all-or-nothing apply.
//! Not optimized for performance.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tokio::time::timeout;

use logiflow_core::{OrderId, Sku};
use logiflow_inventory::InventoryRecord;
use logiflow_orders::Order;

use super::{StockStore, StockTx, StoreError};
use async_trait::async_trait;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Inner {
    records: Mutex<HashMap<Sku, InventoryRecord>>,
    orders: Mutex<HashMap<OrderId, Order>>,
    // Lock table entries are never reclaimed; acceptable for a dev/test store.
    locks: Mutex<HashMap<Sku, Arc<RowLock<()>>>>,
    lock_timeout: Duration,
}

/// In-memory inventory/order store.
#[derive(Debug, Clone)]
pub struct InMemoryStockStore {
    inner: Arc<Inner>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Bound row-lock waits to `lock_timeout` (default 5s).
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                records: Mutex::new(HashMap::new()),
                orders: Mutex::new(HashMap::new()),
                locks: Mutex::new(HashMap::new()),
                lock_timeout,
            }),
        }
    }

    /// Committed view of one record (ignores open units of work).
    pub fn record(&self, sku: &Sku) -> Option<InventoryRecord> {
        self.inner.records.lock().ok()?.get(sku).cloned()
    }

    /// Committed view of one order.
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.inner.orders.lock().ok()?.get(&id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.inner.orders.lock().map(|o| o.len()).unwrap_or(0)
    }
}

impl Default for InMemoryStockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveMode {
    Optimistic { expected: u64 },
    Exclusive,
}

#[derive(Debug)]
struct Staged {
    record: InventoryRecord,
    mode: SaveMode,
}

/// One unit of work. Dropping it without commit discards all staged writes
/// and releases all row locks.
#[derive(Debug)]
pub struct InMemoryStockTx {
    inner: Arc<Inner>,
    guards: Vec<OwnedMutexGuard<()>>,
    locked: HashSet<Sku>,
    staged: HashMap<Sku, Staged>,
    staged_renames: Vec<(Sku, Sku)>,
    staged_orders: Vec<Order>,
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

fn row_lock(inner: &Inner, sku: &Sku) -> Result<Arc<RowLock<()>>, StoreError> {
    let mut locks = inner.locks.lock().map_err(|_| poisoned())?;
    Ok(locks
        .entry(sku.clone())
        .or_insert_with(|| Arc::new(RowLock::new(())))
        .clone())
}

async fn acquire(
    inner: &Inner,
    sku: &Sku,
    guards: &mut Vec<OwnedMutexGuard<()>>,
) -> Result<(), StoreError> {
    let lock = row_lock(inner, sku)?;
    let guard = timeout(inner.lock_timeout, lock.lock_owned())
        .await
        .map_err(|_| StoreError::LockTimeout(format!("SKU {sku}")))?;
    guards.push(guard);
    Ok(())
}

#[async_trait]
impl StockTx for InMemoryStockTx {
    async fn find_by_sku(&mut self, sku: &Sku) -> Result<Option<InventoryRecord>, StoreError> {
        if let Some(staged) = self.staged.get(sku) {
            return Ok(Some(staged.record.clone()));
        }
        let records = self.inner.records.lock().map_err(|_| poisoned())?;
        Ok(records.get(sku).cloned())
    }

    async fn find_by_sku_for_update(
        &mut self,
        sku: &Sku,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        // Re-entrant within one unit of work.
        if !self.locked.contains(sku) {
            acquire(&self.inner, sku, &mut self.guards).await?;
            self.locked.insert(sku.clone());
        }
        self.find_by_sku(sku).await
    }

    async fn save(&mut self, record: InventoryRecord) -> Result<(), StoreError> {
        let sku = record.sku().clone();
        match self.staged.get_mut(&sku) {
            Some(staged) => staged.record = record,
            None => {
                let mode = if self.locked.contains(&sku) {
                    SaveMode::Exclusive
                } else {
                    SaveMode::Optimistic {
                        expected: record.version(),
                    }
                };
                self.staged.insert(sku, Staged { record, mode });
            }
        }
        Ok(())
    }

    async fn rename(&mut self, old_sku: &Sku, new_sku: &Sku) -> Result<(), StoreError> {
        self.staged_renames.push((old_sku.clone(), new_sku.clone()));
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        self.staged_orders.push(order.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut this = self;

        // Optimistic writers wait for any exclusive holder of the row, the
        // way a row UPDATE waits in a real database. Taken in sorted SKU
        // order so concurrent committers cannot cross-block.
        let mut wait_for: BTreeSet<Sku> = BTreeSet::new();
        for (sku, staged) in &this.staged {
            if matches!(staged.mode, SaveMode::Optimistic { .. }) && !this.locked.contains(sku) {
                wait_for.insert(sku.clone());
            }
        }
        for (old, new) in &this.staged_renames {
            if !this.locked.contains(old) {
                wait_for.insert(old.clone());
            }
            if !this.locked.contains(new) {
                wait_for.insert(new.clone());
            }
        }
        for sku in &wait_for {
            acquire(&this.inner, sku, &mut this.guards).await?;
        }

        let now = Utc::now();
        let mut records = this.inner.records.lock().map_err(|_| poisoned())?;
        let mut orders = this.inner.orders.lock().map_err(|_| poisoned())?;

        // Validate everything before touching anything.
        for (sku, staged) in &this.staged {
            if let SaveMode::Optimistic { expected } = staged.mode {
                match records.get(sku) {
                    None if expected == 0 => {}
                    None => {
                        return Err(StoreError::Conflict(format!(
                            "record for SKU {sku} disappeared"
                        )));
                    }
                    Some(_) if expected == 0 => {
                        return Err(StoreError::Conflict(format!(
                            "record already exists for SKU {sku}"
                        )));
                    }
                    Some(existing) if existing.version() != expected => {
                        return Err(StoreError::Conflict(format!(
                            "stale version for SKU {sku} (expected {expected}, found {})",
                            existing.version()
                        )));
                    }
                    Some(_) => {}
                }
            }
        }
        for (old, new) in &this.staged_renames {
            if !records.contains_key(old) {
                return Err(StoreError::Conflict(format!(
                    "no record to rename for SKU {old}"
                )));
            }
            if records.contains_key(new) {
                return Err(StoreError::Conflict(format!(
                    "record already exists for SKU {new}"
                )));
            }
        }
        for order in &this.staged_orders {
            if orders.contains_key(&order.id()) {
                return Err(StoreError::Conflict(format!(
                    "order {} already exists",
                    order.id()
                )));
            }
        }

        // Apply. Renames preserve the version token; saves bump it.
        for (sku, staged) in this.staged.drain() {
            let mut record = staged.record;
            record.mark_committed(record.version() + 1, now);
            records.insert(sku, record);
        }
        for (old, new) in this.staged_renames.drain(..) {
            if let Some(mut record) = records.remove(&old) {
                record.rename(new.clone());
                records.insert(new, record);
            }
        }
        for order in this.staged_orders.drain(..) {
            orders.insert(order.id(), order);
        }

        Ok(())
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    type Tx = InMemoryStockTx;

    async fn begin(&self) -> Result<InMemoryStockTx, StoreError> {
        Ok(InMemoryStockTx {
            inner: Arc::clone(&self.inner),
            guards: Vec::new(),
            locked: HashSet::new(),
            staged: HashMap::new(),
            staged_renames: Vec::new(),
            staged_orders: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sku(s: &str) -> Sku {
        Sku::new(s).unwrap()
    }

    async fn seed(store: &InMemoryStockStore, s: &Sku, quantity: i64) {
        let mut tx = store.begin().await.unwrap();
        tx.save(InventoryRecord::new(s.clone(), quantity).unwrap())
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn dropping_a_tx_discards_staged_writes() {
        let store = InMemoryStockStore::new();
        let s = sku("SKU-001");

        let mut tx = store.begin().await.unwrap();
        tx.save(InventoryRecord::new(s.clone(), 10).unwrap())
            .await
            .unwrap();
        drop(tx);

        assert!(store.record(&s).is_none());
    }

    #[tokio::test]
    async fn stale_optimistic_save_conflicts_at_commit() {
        let store = InMemoryStockStore::new();
        let s = sku("SKU-001");
        seed(&store, &s, 10).await;

        let mut tx1 = store.begin().await.unwrap();
        let mut tx2 = store.begin().await.unwrap();
        let mut r1 = tx1.find_by_sku(&s).await.unwrap().unwrap();
        let mut r2 = tx2.find_by_sku(&s).await.unwrap().unwrap();

        r1.receive(5).unwrap();
        tx1.save(r1).await.unwrap();
        tx1.commit().await.unwrap();

        r2.receive(7).unwrap();
        tx2.save(r2).await.unwrap();
        let err = tx2.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // The losing write left nothing behind.
        assert_eq!(store.record(&s).unwrap().quantity(), 15);
    }

    #[tokio::test]
    async fn racing_creates_conflict_on_uniqueness() {
        let store = InMemoryStockStore::new();
        let s = sku("SKU-001");

        let mut tx1 = store.begin().await.unwrap();
        let mut tx2 = store.begin().await.unwrap();
        tx1.save(InventoryRecord::new(s.clone(), 5).unwrap())
            .await
            .unwrap();
        tx2.save(InventoryRecord::new(s.clone(), 9).unwrap())
            .await
            .unwrap();

        tx1.commit().await.unwrap();
        let err = tx2.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.record(&s).unwrap().quantity(), 5);
    }

    #[tokio::test]
    async fn commit_bumps_version_and_last_updated() {
        let store = InMemoryStockStore::new();
        let s = sku("SKU-001");
        seed(&store, &s, 10).await;
        assert_eq!(store.record(&s).unwrap().version(), 1);

        let mut tx = store.begin().await.unwrap();
        let mut r = tx.find_by_sku(&s).await.unwrap().unwrap();
        r.receive(1).unwrap();
        tx.save(r).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.record(&s).unwrap().version(), 2);
    }

    #[tokio::test]
    async fn rename_to_occupied_sku_conflicts() {
        let store = InMemoryStockStore::new();
        let old = sku("SKU-OLD");
        let new = sku("SKU-NEW");
        seed(&store, &old, 3).await;
        seed(&store, &new, 4).await;

        let mut tx = store.begin().await.unwrap();
        tx.rename(&old, &new).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
