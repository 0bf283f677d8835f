//! `logiflow-events` — domain event channel.
//!
//! The catalog publishes product lifecycle events; the inventory side consumes
//! them to keep records in step (see `logiflow-infra`). Delivery is
//! at-least-once, so consumers must be idempotent.

pub mod bus;
pub mod catalog;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use catalog::{CatalogEvent, ProductRegistered, ProductSkuRenamed};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
