// PostgreSQL UserPurchaseRepository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::UserPurchase;
use crate::domain::repositories::UserPurchaseRepository;
use crate::domain::value_objects::{OrderId, ReservationId, Sku};
use crate::ReservationError;

/// PostgreSQL implementation of UserPurchaseRepository
pub struct PgUserPurchaseRepository {
    pool: PgPool,
}

impl PgUserPurchaseRepository {
    /// Creates a new PgUserPurchaseRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserPurchaseRepository for PgUserPurchaseRepository {
    async fn exists(&self, user_id: Uuid, sku: &Sku) -> Result<bool, ReservationError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_purchases WHERE user_id = $1 AND sku_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(sku.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find(
        &self,
        user_id: Uuid,
        sku: &Sku,
    ) -> Result<Option<UserPurchase>, ReservationError> {
        let row = sqlx::query_as::<_, UserPurchaseRow>(
            r#"
            SELECT user_id, sku_id, order_id, reservation_id, purchased_at
            FROM user_purchases
            WHERE user_id = $1 AND sku_id = $2
            "#,
        )
        .bind(user_id)
        .bind(sku.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserPurchase::from))
    }
}

/// Internal row type for mapping purchase database results
#[derive(sqlx::FromRow)]
struct UserPurchaseRow {
    user_id: Uuid,
    sku_id: String,
    order_id: Uuid,
    reservation_id: Uuid,
    purchased_at: DateTime<Utc>,
}

impl From<UserPurchaseRow> for UserPurchase {
    fn from(row: UserPurchaseRow) -> Self {
        UserPurchase::new(
            row.user_id,
            Sku::from_string(row.sku_id),
            OrderId::from_uuid(row.order_id),
            ReservationId::from_uuid(row.reservation_id),
            row.purchased_at,
        )
    }
}
