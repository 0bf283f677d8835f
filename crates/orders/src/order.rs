use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use logiflow_core::{DomainError, DomainResult, OrderId, Sku};

/// Order lifecycle status.
///
/// Order creation only ever produces `Pending`; later transitions are driven
/// by fulfilment, outside the reservation core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Cancelled,
}

/// Order line as requested by the caller (no price yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub sku: Sku,
    pub quantity: i64,
}

/// Order item: SKU, quantity, price snapshot.
///
/// The price is copied from the catalog at creation time and stays decoupled
/// from later catalog price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub sku: Sku,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub price_at_time_of_order: u64,
}

/// Aggregate root: Order.
///
/// The order owns its items exclusively; items have no identity or lifecycle
/// outside their parent order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_name: String,
    status: OrderStatus,
    items: Vec<OrderItem>,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order in `Pending` status.
    ///
    /// Validates the request shape: non-blank customer name, at least one
    /// item, every quantity >= 1.
    pub fn pending(customer_name: impl Into<String>, items: Vec<OrderItem>) -> DomainResult<Self> {
        let customer_name = customer_name.into();
        if customer_name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be blank"));
        }
        if items.is_empty() {
            return Err(DomainError::validation("order must have at least one item"));
        }
        for item in &items {
            if item.quantity < 1 {
                return Err(DomainError::validation(format!(
                    "quantity for SKU {} must be at least 1",
                    item.sku
                )));
            }
        }
        Ok(Self {
            id: OrderId::new(),
            customer_name,
            status: OrderStatus::Pending,
            items,
            created_at: Utc::now(),
        })
    }

    /// Rebuild an order from stored fields. Used by store implementations.
    pub fn from_stored(
        id: OrderId,
        customer_name: String,
        status: OrderStatus,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_name,
            status,
            items,
            created_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, quantity: i64, price: u64) -> OrderItem {
        OrderItem {
            sku: Sku::new(sku).unwrap(),
            quantity,
            price_at_time_of_order: price,
        }
    }

    #[test]
    fn pending_order_snapshots_items() {
        let order = Order::pending("John Doe", vec![item("SKU-001", 5, 2999)]).unwrap();
        assert_eq!(order.customer_name(), "John Doe");
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.items()[0].quantity, 5);
        assert_eq!(order.items()[0].price_at_time_of_order, 2999);
    }

    #[test]
    fn rejects_blank_customer_name() {
        let err = Order::pending("   ", vec![item("SKU-001", 1, 100)]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_empty_item_list() {
        let err = Order::pending("Jane", vec![]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_non_positive_quantities() {
        let err = Order::pending("Jane", vec![item("SKU-001", 0, 100)]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn orders_with_same_fields_but_distinct_ids_differ() {
        let a = Order::pending("Jane", vec![item("SKU-001", 1, 100)]).unwrap();
        let b = Order::pending("Jane", vec![item("SKU-001", 1, 100)]).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
