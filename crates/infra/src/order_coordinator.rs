//! Order creation: catalog check, line reservations, and persistence in one
//! atomic unit of work.

use std::collections::BTreeSet;

use tracing::{info, instrument};

use logiflow_core::Sku;
use logiflow_orders::{NewOrderLine, Order, OrderItem};

use crate::catalog::CatalogLookup;
use crate::error::ServiceError;
use crate::reservation::reserve_stock_in;
use crate::store::{StockStore, StockTx};

/// Creates orders against the catalog and the record store.
#[derive(Debug, Clone)]
pub struct OrderCoordinator<S, C> {
    store: S,
    catalog: C,
}

impl<S: StockStore, C: CatalogLookup> OrderCoordinator<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Create a pending order for `customer_name`.
    ///
    /// One catalog lookup covers every distinct SKU; if any are missing the
    /// order is rejected up front with the full missing list and no stock is
    /// touched. Otherwise each line is reserved in the caller's order inside
    /// a single unit of work, so the first failure rolls back every earlier
    /// reservation.
    #[instrument(skip(self, lines), fields(customer = customer_name, lines = lines.len()))]
    pub async fn create_order(
        &self,
        customer_name: &str,
        lines: &[NewOrderLine],
    ) -> Result<Order, ServiceError> {
        if customer_name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "customer name cannot be blank".into(),
            ));
        }
        if lines.is_empty() {
            return Err(ServiceError::Validation(
                "order must have at least one line".into(),
            ));
        }
        for line in lines {
            if line.quantity < 1 {
                return Err(ServiceError::Validation(format!(
                    "quantity for SKU {} must be at least 1",
                    line.sku
                )));
            }
        }

        let requested: BTreeSet<Sku> = lines.iter().map(|line| line.sku.clone()).collect();
        let prices = self.catalog.find_prices(&requested).await?;

        let missing: Vec<Sku> = requested
            .iter()
            .filter(|sku| !prices.contains_key(*sku))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::ProductsNotFound { skus: missing });
        }

        let mut tx = self.store.begin().await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            info!(quantity = line.quantity, sku = %line.sku, "reserving stock for order line");
            reserve_stock_in(&mut tx, &line.sku, line.quantity).await?;
            let price = prices
                .get(&line.sku)
                .copied()
                .ok_or_else(|| ServiceError::ProductsNotFound {
                    skus: vec![line.sku.clone()],
                })?;
            items.push(OrderItem {
                sku: line.sku.clone(),
                quantity: line.quantity,
                price_at_time_of_order: price,
            });
        }

        let order = Order::pending(customer_name, items)?;
        tx.insert_order(&order).await?;
        tx.commit().await?;

        info!(order_id = %order.id(), customer = customer_name, "order created");
        Ok(order)
    }
}
