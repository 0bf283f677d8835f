//! `logiflow-inventory` — stock-level domain model.
//!
//! Owns the per-SKU invariant `0 <= reserved <= quantity` as pure state
//! transitions. Persistence and locking live in `logiflow-infra`.

pub mod record;

pub use record::InventoryRecord;
