// PostgreSQL ReservationRepository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::Reservation;
use crate::domain::repositories::{ExpiryOutcome, ReservationRepository};
use crate::domain::value_objects::{IdempotencyKey, ReservationId, ReservationStatus, Sku};
use crate::ReservationError;

const RESERVATION_COLUMNS: &str = "id, user_id, sku_id, quantity, status, created_at, \
     expires_at, confirmed_at, expired_at, cancelled_at, idempotency_key";

/// PostgreSQL implementation of ReservationRepository
pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    /// Creates a new PgReservationRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn find_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<Reservation>, ReservationError> {
        let query = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1");
        let row = sqlx::query_as::<_, ReservationRow>(&query)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn find_by_idempotency_key(
        &self,
        key: IdempotencyKey,
    ) -> Result<Option<Reservation>, ReservationError> {
        let query =
            format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE idempotency_key = $1");
        let row = sqlx::query_as::<_, ReservationRow>(&query)
            .bind(key.into_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        sku: &Sku,
    ) -> Result<Option<Reservation>, ReservationError> {
        let query = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE user_id = $1 AND sku_id = $2 AND status IN ('reserved', 'confirmed')"
        );
        let row = sqlx::query_as::<_, ReservationRow>(&query)
            .bind(user_id)
            .bind(sku.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn find_expired(&self, limit: i64) -> Result<Vec<Reservation>, ReservationError> {
        let query = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE status = 'reserved' AND expires_at < NOW() \
             ORDER BY expires_at ASC \
             LIMIT $1"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn expire(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<ExpiryOutcome, ReservationError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET LOCAL statement_timeout = '5s'")
            .execute(&mut *tx)
            .await?;

        // The status predicate serializes against confirm and cancel:
        // whoever flips the row first wins, the other sees zero rows.
        let query = format!(
            "UPDATE reservations \
             SET status = 'expired', expired_at = $2 \
             WHERE id = $1 AND status = 'reserved' \
             RETURNING {RESERVATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReservationRow>(&query)
            .bind(id.into_uuid())
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(ExpiryOutcome::AlreadyTerminal);
        };
        let reservation: Reservation = row.try_into()?;

        release_unit(&mut tx, reservation.sku()).await?;
        tx.commit().await?;

        Ok(ExpiryOutcome::Expired(reservation))
    }

    async fn cancel(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ReservationError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET LOCAL statement_timeout = '1s'")
            .execute(&mut *tx)
            .await?;

        let query =
            format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, ReservationRow>(&query)
            .bind(id.into_uuid())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(ReservationError::ReservationNotFound(id.into_uuid()));
        };
        let mut reservation: Reservation = row.try_into()?;
        if let Err(err) = reservation.cancel(now) {
            tx.rollback().await?;
            return Err(err);
        }

        sqlx::query("UPDATE reservations SET status = 'cancelled', cancelled_at = $2 WHERE id = $1")
            .bind(id.into_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await?;

        release_unit(&mut tx, reservation.sku()).await?;
        tx.commit().await?;

        Ok(reservation)
    }
}

/// Releases one reserved unit back to the pool within the transaction.
async fn release_unit(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    sku: &Sku,
) -> Result<(), ReservationError> {
    sqlx::query(
        r#"
        UPDATE inventory
        SET reserved_count = reserved_count - 1,
            available_count = total_count - (reserved_count - 1) - sold_count,
            version = version + 1,
            updated_at = NOW()
        WHERE sku_id = $1 AND reserved_count >= 1
        "#,
    )
    .bind(sku.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Internal row type for mapping reservation database results
#[derive(sqlx::FromRow)]
pub(crate) struct ReservationRow {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) sku_id: String,
    pub(crate) quantity: i32,
    pub(crate) status: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) expires_at: DateTime<Utc>,
    pub(crate) confirmed_at: Option<DateTime<Utc>>,
    pub(crate) expired_at: Option<DateTime<Utc>>,
    pub(crate) cancelled_at: Option<DateTime<Utc>>,
    pub(crate) idempotency_key: Uuid,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = ReservationError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let status: ReservationStatus = row.status.parse()?;
        Ok(Reservation::reconstitute(
            ReservationId::from_uuid(row.id),
            row.user_id,
            Sku::from_string(row.sku_id),
            row.quantity,
            status,
            row.created_at,
            row.expires_at,
            row.confirmed_at,
            row.expired_at,
            row.cancelled_at,
            IdempotencyKey::from_uuid(row.idempotency_key),
        ))
    }
}
