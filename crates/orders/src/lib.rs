//! `logiflow-orders` — order aggregate domain model.

pub mod order;

pub use order::{NewOrderLine, Order, OrderItem, OrderStatus};
