//! Catalog event consumer keeping inventory records in step with the
//! product catalog.

use tracing::warn;

use logiflow_events::bus::Subscription;
use logiflow_events::catalog::CatalogEvent;
use logiflow_events::event::Event;

use crate::error::ServiceError;
use crate::reservation::ReservationEngine;
use crate::store::StockStore;

/// Consumes [`CatalogEvent`]s and applies them to inventory records.
///
/// Delivery is at least once; both handlers tolerate redelivery. A failed
/// event is logged and skipped, never stops the loop.
pub struct InventoryBootstrap<S> {
    engine: ReservationEngine<S>,
}

impl<S: StockStore> InventoryBootstrap<S> {
    pub fn new(engine: ReservationEngine<S>) -> Self {
        Self { engine }
    }

    /// Drain the subscription until the publishing side shuts down.
    pub async fn run(self, mut subscription: Subscription<CatalogEvent>) {
        while let Some(event) = subscription.recv().await {
            if let Err(error) = self.handle(&event).await {
                warn!(
                    event_type = event.event_type(),
                    %error,
                    "failed to apply catalog event"
                );
            }
        }
    }

    /// Apply a single catalog event.
    pub async fn handle(&self, event: &CatalogEvent) -> Result<(), ServiceError> {
        match event {
            CatalogEvent::ProductRegistered(e) => self.engine.initialize_inventory(&e.sku).await,
            CatalogEvent::ProductSkuRenamed(e) => {
                match self.engine.rename_sku(&e.old_sku, &e.new_sku).await {
                    // Old SKU gone but the new one exists: the rename already
                    // landed, so a redelivery is a no-op.
                    Err(ServiceError::NotFound { .. })
                        if self.engine.get_available(&e.new_sku).await.is_ok() =>
                    {
                        Ok(())
                    }
                    other => other,
                }
            }
        }
    }
}
