// PostgreSQL ProductRepository implementation

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::entities::Product;
use crate::domain::repositories::ProductRepository;
use crate::domain::value_objects::Sku;
use crate::ReservationError;

/// PostgreSQL implementation of ProductRepository
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Creates a new PgProductRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<Product>, ReservationError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT sku_id, name, category, base_price, sale_price, total_inventory,
                   active, event_id, created_at, updated_at
            FROM products
            WHERE sku_id = $1
            "#,
        )
        .bind(sku.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }
}

/// Internal row type for mapping product database results
#[derive(sqlx::FromRow)]
struct ProductRow {
    sku_id: String,
    name: String,
    category: String,
    base_price: Decimal,
    sale_price: Decimal,
    total_inventory: i64,
    active: bool,
    event_id: uuid::Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product::reconstitute(
            Sku::from_string(row.sku_id),
            row.name,
            row.category,
            row.base_price,
            row.sale_price,
            row.total_inventory,
            row.active,
            row.event_id,
            row.created_at,
            row.updated_at,
        )
    }
}
