//! Domain error model.

use thiserror::Error;

use crate::sku::Sku;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, missing records). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// No inventory record exists for the SKU.
    #[error("inventory not found for SKU: {sku}")]
    NotFound { sku: Sku },

    /// Available stock was less than requested; nothing was reserved.
    #[error("insufficient stock available to reserve {requested} of SKU {sku} ({available} available)")]
    InsufficientStock {
        sku: Sku,
        requested: i64,
        available: i64,
    },

    /// An order referenced SKUs the catalog does not know. Lists every
    /// missing SKU, not just the first.
    #[error("products not found for SKUs: [{}]", .skus.iter().map(Sku::as_str).collect::<Vec<_>>().join(", "))]
    ProductsNotFound { skus: Vec<Sku> },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(sku: Sku) -> Self {
        Self::NotFound { sku }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_not_found_lists_every_sku() {
        let err = DomainError::ProductsNotFound {
            skus: vec![Sku::new("GHOST-1").unwrap(), Sku::new("GHOST-2").unwrap()],
        };
        assert_eq!(
            err.to_string(),
            "products not found for SKUs: [GHOST-1, GHOST-2]"
        );
    }

    #[test]
    fn insufficient_stock_names_the_offending_sku() {
        let err = DomainError::InsufficientStock {
            sku: Sku::new("WM-001").unwrap(),
            requested: 11,
            available: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("WM-001"));
        assert!(msg.contains("11"));
        assert!(msg.contains("10"));
    }
}
