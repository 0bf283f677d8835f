//! Product catalog lookup contract.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use logiflow_core::Sku;

use crate::store::StoreError;

/// Read-only view of the product catalog.
///
/// One batched call per order. A SKU absent from the returned map does not
/// exist in the catalog (or is not sellable); the caller decides what that
/// means.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Current prices for the given SKUs, in the smallest currency unit.
    async fn find_prices(&self, skus: &BTreeSet<Sku>) -> Result<HashMap<Sku, u64>, StoreError>;
}

/// In-memory catalog for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    prices: Arc<Mutex<HashMap<Sku, u64>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, sku: Sku, price: u64) {
        self.prices
            .lock()
            .expect("catalog mutex poisoned")
            .insert(sku, price);
    }

    pub fn remove(&self, sku: &Sku) {
        self.prices
            .lock()
            .expect("catalog mutex poisoned")
            .remove(sku);
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn find_prices(&self, skus: &BTreeSet<Sku>) -> Result<HashMap<Sku, u64>, StoreError> {
        let prices = self
            .prices
            .lock()
            .map_err(|_| StoreError::Backend("catalog mutex poisoned".into()))?;
        Ok(skus
            .iter()
            .filter_map(|sku| prices.get(sku).map(|price| (sku.clone(), *price)))
            .collect())
    }
}
