//! Postgres-backed record store.
//!
//! The two write disciplines map onto native primitives:
//!
//! - exclusive read → `SELECT ... FOR UPDATE` (row lock held until the
//!   transaction ends, bounded by `SET LOCAL lock_timeout`)
//! - optimistic save → `UPDATE ... WHERE version = $n` plus the unique
//!   constraint on `sku` for racing creates
//!
//! ## Error mapping
//!
//! | SQLSTATE | Scenario | `StoreError` |
//! |----------|----------|--------------|
//! | `23505`  | unique violation (racing create / rename target taken) | `Conflict` |
//! | `55P03`  | `lock_timeout` exceeded waiting for a row lock | `LockTimeout` |
//! | other    | connection, IO, constraint failures | `Backend` |

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use logiflow_core::Sku;
use logiflow_inventory::InventoryRecord;
use logiflow_orders::{Order, OrderStatus};

use super::{StockStore, StockTx, StoreError};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres inventory/order store.
///
/// `Clone` shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStockStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_lock_timeout(pool, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migrate: {e}")))
    }
}

/// One Postgres transaction.
#[derive(Debug)]
pub struct PostgresStockTx {
    tx: Transaction<'static, Postgres>,
}

fn map_sqlx_error(op: &str, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        match db.code().as_deref() {
            Some("23505") => return StoreError::Conflict(format!("{op}: {}", db.message())),
            Some("55P03") => return StoreError::LockTimeout(format!("{op}: {}", db.message())),
            _ => {}
        }
    }
    StoreError::Backend(format!("{op}: {e}"))
}

fn record_from_row(row: &PgRow) -> Result<InventoryRecord, StoreError> {
    let sku: String = row
        .try_get("sku")
        .map_err(|e| map_sqlx_error("read sku", e))?;
    let quantity: i64 = row
        .try_get("quantity")
        .map_err(|e| map_sqlx_error("read quantity", e))?;
    let reserved: i64 = row
        .try_get("reserved")
        .map_err(|e| map_sqlx_error("read reserved", e))?;
    let version: i64 = row
        .try_get("version")
        .map_err(|e| map_sqlx_error("read version", e))?;
    let last_updated: DateTime<Utc> = row
        .try_get("last_updated")
        .map_err(|e| map_sqlx_error("read last_updated", e))?;

    let sku = Sku::new(sku).map_err(|e| StoreError::Backend(format!("stored SKU invalid: {e}")))?;
    Ok(InventoryRecord::from_stored(
        sku,
        quantity,
        reserved,
        version as u64,
        last_updated,
    ))
}

fn status_as_str(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Confirmed => "confirmed",
        OrderStatus::Shipped => "shipped",
        OrderStatus::Cancelled => "cancelled",
    }
}

#[async_trait]
impl StockTx for PostgresStockTx {
    async fn find_by_sku(&mut self, sku: &Sku) -> Result<Option<InventoryRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT sku, quantity, reserved, version, last_updated
            FROM inventories
            WHERE sku = $1
            "#,
        )
        .bind(sku.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_by_sku", e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self), fields(sku = %sku), err)]
    async fn find_by_sku_for_update(
        &mut self,
        sku: &Sku,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT sku, quantity, reserved, version, last_updated
            FROM inventories
            WHERE sku = $1
            FOR UPDATE
            "#,
        )
        .bind(sku.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_by_sku_for_update", e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self, record), fields(sku = %record.sku()), err)]
    async fn save(&mut self, record: InventoryRecord) -> Result<(), StoreError> {
        if record.version() == 0 {
            sqlx::query(
                r#"
                INSERT INTO inventories (sku, quantity, reserved, version, last_updated)
                VALUES ($1, $2, $3, 1, now())
                "#,
            )
            .bind(record.sku().as_str())
            .bind(record.quantity())
            .bind(record.reserved())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("save (insert)", e))?;
            return Ok(());
        }

        let result = sqlx::query(
            r#"
            UPDATE inventories
            SET quantity = $2, reserved = $3, version = version + 1, last_updated = now()
            WHERE sku = $1 AND version = $4
            "#,
        )
        .bind(record.sku().as_str())
        .bind(record.quantity())
        .bind(record.reserved())
        .bind(record.version() as i64)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save (update)", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "stale version for SKU {} (expected {})",
                record.sku(),
                record.version()
            )));
        }
        Ok(())
    }

    async fn rename(&mut self, old_sku: &Sku, new_sku: &Sku) -> Result<(), StoreError> {
        // Version stays put: a rename is an identity move, not a stock change.
        let result = sqlx::query(
            r#"
            UPDATE inventories
            SET sku = $2, last_updated = now()
            WHERE sku = $1
            "#,
        )
        .bind(old_sku.as_str())
        .bind(new_sku.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("rename", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "no record to rename for SKU {old_sku}"
            )));
        }
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_name, status, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(*order.id().as_uuid())
        .bind(order.customer_name())
        .bind(status_as_str(order.status()))
        .bind(order.created_at())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for (line_no, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, line_no, sku, quantity, price_at_time_of_order)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(*order.id().as_uuid())
            .bind((line_no + 1) as i32)
            .bind(item.sku.as_str())
            .bind(item.quantity)
            .bind(item.price_at_time_of_order as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order (item)", e))?;
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}

#[async_trait]
impl StockStore for PostgresStockStore {
    type Tx = PostgresStockTx;

    async fn begin(&self) -> Result<PostgresStockTx, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        // Bound row-lock waits; a timed-out wait surfaces as a retryable
        // infrastructure error, never as an insufficient-stock answer.
        let millis = self.lock_timeout.as_millis();
        sqlx::query(&format!("SET LOCAL lock_timeout = '{millis}ms'"))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set lock_timeout", e))?;

        Ok(PostgresStockTx { tx })
    }
}
