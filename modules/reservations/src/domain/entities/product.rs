// Product entity - read-mostly sale catalog record

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Sku;

/// A product participating in a flash-sale event.
///
/// Created by the external catalog admin path before the sale is armed and
/// immutable during the sale window. The reservation core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    sku: Sku,
    name: String,
    category: String,
    base_price: Decimal,
    sale_price: Decimal,
    total_inventory: i64,
    active: bool,
    event_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Reconstitutes a Product from persistence
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        sku: Sku,
        name: String,
        category: String,
        base_price: Decimal,
        sale_price: Decimal,
        total_inventory: i64,
        active: bool,
        event_id: Uuid,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sku,
            name,
            category,
            base_price,
            sale_price,
            total_inventory,
            active,
            event_id,
            created_at,
            updated_at,
        }
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    pub fn sale_price(&self) -> Decimal {
        self.sale_price
    }

    pub fn total_inventory(&self) -> i64 {
        self.total_inventory
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reconstitute() {
        let now = Utc::now();
        let product = Product::reconstitute(
            Sku::from_string("SALE-TV-55".to_string()),
            "55\" Television".to_string(),
            "electronics".to_string(),
            dec!(899.99),
            dec!(499.99),
            100,
            true,
            Uuid::nil(),
            now,
            now,
        );
        assert_eq!(product.sku().as_str(), "SALE-TV-55");
        assert!(product.is_active());
        assert_eq!(product.sale_price(), dec!(499.99));
        assert_eq!(product.total_inventory(), 100);
    }
}
