//! Infrastructure layer: record store, catalog lookup, services, event consumer.
//!
//! The domain crates (`logiflow-inventory`, `logiflow-orders`) stay pure; this
//! crate owns every seam with IO:
//!
//! - [`store`] — the inventory record store contract and its in-memory and
//!   Postgres implementations (optimistic saves vs. row-exclusive reads)
//! - [`reservation`] — the reservation engine guarding `reserved <= quantity`
//! - [`order_coordinator`] — multi-line order creation in one unit of work
//! - [`catalog`] — the external catalog lookup contract
//! - [`bootstrap`] — the catalog event consumer keeping records in step

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod error;
pub mod order_coordinator;
pub mod reservation;
pub mod store;


pub use bootstrap::InventoryBootstrap;
pub use catalog::{CatalogLookup, InMemoryCatalog};
pub use config::StoreConfig;
pub use error::ServiceError;
pub use order_coordinator::OrderCoordinator;
pub use reservation::{AdjustmentDirection, ReservationEngine, StockAdjustment};
pub use store::{InMemoryStockStore, PostgresStockStore, StockStore, StockTx, StoreError};
