//! Service-level error, unifying domain and storage failures.

use thiserror::Error;

use logiflow_core::{DomainError, Sku};

use crate::store::StoreError;

/// Failure of a reservation or order operation.
///
/// Callers can match on this to distinguish caller mistakes (`Validation`,
/// `NotFound`, `InsufficientStock`, `ProductsNotFound`), transient write
/// races (`Conflict`), and infrastructure trouble (`Store`). Only the last
/// two are worth retrying.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("inventory not found for SKU: {sku}")]
    NotFound { sku: Sku },

    #[error(
        "insufficient stock available to reserve {requested} of SKU {sku} ({available} available)"
    )]
    InsufficientStock {
        sku: Sku,
        requested: i64,
        available: i64,
    },

    #[error("products not found for SKUs: [{}]", .skus.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "))]
    ProductsNotFound { skus: Vec<Sku> },

    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("infrastructure failure")]
    Store(#[source] StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::NotFound { sku } => Self::NotFound { sku },
            DomainError::InsufficientStock {
                sku,
                requested,
                available,
            } => Self::InsufficientStock {
                sku,
                requested,
                available,
            },
            DomainError::ProductsNotFound { skus } => Self::ProductsNotFound { skus },
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_timeout_maps_to_infrastructure_not_stock() {
        let err = ServiceError::from(StoreError::LockTimeout("row lock".into()));
        assert!(matches!(err, ServiceError::Store(StoreError::LockTimeout(_))));
    }

    #[test]
    fn store_conflict_maps_to_conflict() {
        let err = ServiceError::from(StoreError::Conflict("stale version".into()));
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn domain_errors_carry_through() {
        let err = ServiceError::from(DomainError::not_found(
            Sku::new("SKU-404").unwrap(),
        ));
        assert_eq!(err.to_string(), "inventory not found for SKU: SKU-404");
    }

    #[test]
    fn products_not_found_lists_every_sku() {
        let err = ServiceError::ProductsNotFound {
            skus: vec![Sku::new("GHOST-1").unwrap(), Sku::new("GHOST-2").unwrap()],
        };
        assert_eq!(
            err.to_string(),
            "products not found for SKUs: [GHOST-1, GHOST-2]"
        );
    }
}
