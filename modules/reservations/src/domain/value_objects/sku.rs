// Sku value object - identifier of one product in the sale

use serde::{Deserialize, Serialize};

use crate::ReservationError;

const MAX_LEN: usize = 64;

/// Stock keeping unit for a flash-sale product.
///
/// SKUs are assigned by the catalog admin path before the sale is armed;
/// this type only validates shape. A SKU doubles as the bus record key,
/// so all requests for it land on one partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    /// Validates and wraps a caller-provided SKU.
    pub fn new(value: impl Into<String>) -> Result<Self, ReservationError> {
        let value = value.into();
        if value.is_empty() || value.len() > MAX_LEN {
            return Err(ReservationError::InvalidSku(value));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ReservationError::InvalidSku(value));
        }
        Ok(Self(value))
    }

    /// Reconstitutes a SKU from the database (already validated on entry).
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    /// Returns the SKU as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_sku() {
        let sku = Sku::new("SALE-TV-55").unwrap();
        assert_eq!(sku.as_str(), "SALE-TV-55");
    }

    #[test]
    fn test_empty_sku_rejected() {
        assert!(matches!(
            Sku::new(""),
            Err(ReservationError::InvalidSku(_))
        ));
    }

    #[test]
    fn test_sku_with_spaces_rejected() {
        assert!(matches!(
            Sku::new("SALE TV"),
            Err(ReservationError::InvalidSku(_))
        ));
    }

    #[test]
    fn test_overlong_sku_rejected() {
        let long = "X".repeat(65);
        assert!(matches!(
            Sku::new(long),
            Err(ReservationError::InvalidSku(_))
        ));
    }
}
