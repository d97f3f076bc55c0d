// PostgreSQL InventoryRepository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::SkuInventory;
use crate::domain::repositories::InventoryRepository;
use crate::domain::value_objects::Sku;
use crate::ReservationError;

/// PostgreSQL implementation of InventoryRepository
pub struct PgInventoryRepository {
    pool: PgPool,
}

impl PgInventoryRepository {
    /// Creates a new PgInventoryRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRepository for PgInventoryRepository {
    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<SkuInventory>, ReservationError> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT sku_id, total_count, reserved_count, sold_count, version, updated_at
            FROM inventory
            WHERE sku_id = $1
            "#,
        )
        .bind(sku.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SkuInventory::from))
    }
}

/// Internal row type for mapping inventory database results
#[derive(sqlx::FromRow)]
pub(crate) struct InventoryRow {
    pub(crate) sku_id: String,
    pub(crate) total_count: i64,
    pub(crate) reserved_count: i64,
    pub(crate) sold_count: i64,
    pub(crate) version: i64,
    pub(crate) updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<InventoryRow> for SkuInventory {
    fn from(row: InventoryRow) -> Self {
        SkuInventory::reconstitute(
            Sku::from_string(row.sku_id),
            row.total_count,
            row.reserved_count,
            row.sold_count,
            row.version,
            row.updated_at,
        )
    }
}
