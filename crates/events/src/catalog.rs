//! Inbound catalog events consumed by the inventory bootstrap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use logiflow_core::Sku;

use crate::event::Event;

/// Event: a new product was registered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRegistered {
    pub sku: Sku,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a product's SKU changed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSkuRenamed {
    pub old_sku: Sku,
    pub new_sku: Sku,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEvent {
    ProductRegistered(ProductRegistered),
    ProductSkuRenamed(ProductSkuRenamed),
}

impl Event for CatalogEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::ProductRegistered(_) => "catalog.product.registered",
            CatalogEvent::ProductSkuRenamed(_) => "catalog.product.sku_renamed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CatalogEvent::ProductRegistered(e) => e.occurred_at,
            CatalogEvent::ProductSkuRenamed(e) => e.occurred_at,
        }
    }
}
