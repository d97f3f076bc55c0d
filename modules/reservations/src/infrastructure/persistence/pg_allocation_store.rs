// PostgreSQL AllocationStore implementation
//
// One transaction per call: the conditional counter update, the batched
// reservation insert and the duplicate compensation commit together or
// not at all.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::Reservation;
use crate::domain::repositories::{AllocationReceipt, AllocationStore};
use crate::domain::value_objects::Sku;
use crate::ReservationError;

/// PostgreSQL implementation of AllocationStore
pub struct PgAllocationStore {
    pool: PgPool,
}

impl PgAllocationStore {
    /// Creates a new PgAllocationStore with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AllocationStore for PgAllocationStore {
    async fn try_allocate(
        &self,
        sku: &Sku,
        drafts: &[Reservation],
    ) -> Result<Option<AllocationReceipt>, ReservationError> {
        let units = drafts.len() as i64;
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET LOCAL statement_timeout = '1s'")
            .execute(&mut *tx)
            .await?;

        // The availability predicate is the oversell guard. Zero rows
        // updated means the guard rejected the whole attempt.
        let updated = sqlx::query(
            r#"
            UPDATE inventory
            SET reserved_count = reserved_count + $2,
                available_count = total_count - (reserved_count + $2) - sold_count,
                version = version + 1,
                updated_at = NOW()
            WHERE sku_id = $1 AND available_count >= $2
            "#,
        )
        .bind(sku.as_str())
        .bind(units)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let mut allocated = Vec::new();
        let mut duplicates = Vec::new();
        for draft in drafts {
            // ON CONFLICT DO NOTHING without a target skips rows hitting
            // any unique constraint: the idempotency key or the partial
            // one-active-per-(user, sku) index.
            let inserted = sqlx::query(
                r#"
                INSERT INTO reservations (
                    id, user_id, sku_id, quantity, status, created_at, expires_at,
                    idempotency_key
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(draft.id().into_uuid())
            .bind(draft.user_id())
            .bind(draft.sku().as_str())
            .bind(draft.quantity())
            .bind(draft.status().to_string())
            .bind(draft.created_at())
            .bind(draft.expires_at())
            .bind(draft.idempotency_key().into_uuid())
            .execute(&mut *tx)
            .await?;

            if inserted.rows_affected() == 1 {
                allocated.push(draft.clone());
            } else {
                duplicates.push(draft.clone());
            }
        }

        // Hand back the units of skipped drafts so the receipt never
        // holds more than its inserted rows.
        let skipped = duplicates.len() as i64;
        if skipped > 0 {
            sqlx::query(
                r#"
                UPDATE inventory
                SET reserved_count = reserved_count - $2,
                    available_count = total_count - (reserved_count - $2) - sold_count,
                    version = version + 1,
                    updated_at = NOW()
                WHERE sku_id = $1
                "#,
            )
            .bind(sku.as_str())
            .bind(skipped)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Some(AllocationReceipt {
            allocated,
            duplicates,
        }))
    }
}
