//! SKU value object: equality by value, immutable once constructed.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Stock Keeping Unit — the unique product identifier shared between the
/// catalog and the inventory record store (e.g. `WM-001`).
///
/// A SKU is a value object: it carries no identity of its own and is compared
/// by value. Inventory records are keyed by SKU; moving a record to a new SKU
/// goes through an explicit rename operation, never a normal update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Create a SKU, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be blank"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sku {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Sku {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_regular_skus() {
        let sku = Sku::new("WM-001").unwrap();
        assert_eq!(sku.as_str(), "WM-001");
        assert_eq!(sku.to_string(), "WM-001");
    }

    #[test]
    fn rejects_blank_skus() {
        assert!(Sku::new("").is_err());
        assert!(Sku::new("   ").is_err());
    }

    #[test]
    fn compared_by_value() {
        assert_eq!(Sku::new("A-1").unwrap(), Sku::new("A-1").unwrap());
        assert_ne!(Sku::new("A-1").unwrap(), Sku::new("A-2").unwrap());
    }
}
