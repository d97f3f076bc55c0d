// PostgreSQL CheckoutRepository implementation
//
// The confirm path commits as one transaction: row-locked status check,
// reservation flip, inventory reserved -> sold, purchase record, order
// insert. Racing the expiry sweep is serialized on the reservation row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Order, Reservation};
use crate::domain::repositories::{CheckoutRecord, CheckoutRepository, ConfirmCheckout};
use crate::domain::value_objects::{OrderId, OrderStatus, ReservationId, Sku};
use crate::infrastructure::persistence::is_unique_violation;
use crate::infrastructure::persistence::pg_reservation_repository::ReservationRow;
use crate::ReservationError;

/// PostgreSQL implementation of CheckoutRepository
pub struct PgCheckoutRepository {
    pool: PgPool,
}

impl PgCheckoutRepository {
    /// Creates a new PgCheckoutRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckoutRepository for PgCheckoutRepository {
    async fn confirm(
        &self,
        checkout: &ConfirmCheckout,
    ) -> Result<CheckoutRecord, ReservationError> {
        let id = checkout.reservation_id.into_uuid();
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET LOCAL statement_timeout = '1s'")
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, user_id, sku_id, quantity, status, created_at, expires_at,
                   confirmed_at, expired_at, cancelled_at, idempotency_key
            FROM reservations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(ReservationError::ReservationNotFound(id));
        };
        let mut reservation: Reservation = row.try_into()?;
        if let Err(err) = reservation.confirm(checkout.now) {
            tx.rollback().await?;
            return Err(err);
        }

        sqlx::query("UPDATE reservations SET status = 'confirmed', confirmed_at = $2 WHERE id = $1")
            .bind(id)
            .bind(checkout.now)
            .execute(&mut *tx)
            .await?;

        let moved = sqlx::query(
            r#"
            UPDATE inventory
            SET reserved_count = reserved_count - 1,
                sold_count = sold_count + 1,
                available_count = total_count - (reserved_count - 1) - (sold_count + 1),
                version = version + 1,
                updated_at = NOW()
            WHERE sku_id = $1 AND reserved_count >= 1
            "#,
        )
        .bind(reservation.sku().as_str())
        .execute(&mut *tx)
        .await?;
        if moved.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(ReservationError::InventoryNotFound(
                reservation.sku().as_str().to_string(),
            ));
        }

        let order = Order::create(
            reservation.id(),
            reservation.user_id(),
            reservation.sku().clone(),
            checkout.payment_transaction_id.clone(),
            checkout.payment_method.clone(),
            checkout.shipping_address.clone(),
            checkout.now,
        );

        // Belt and suspenders for the one-per-user rule: the unique key
        // catches anything validation let through.
        let purchase = sqlx::query(
            r#"
            INSERT INTO user_purchases (user_id, sku_id, order_id, reservation_id, purchased_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(reservation.user_id())
        .bind(reservation.sku().as_str())
        .bind(order.id().into_uuid())
        .bind(id)
        .bind(checkout.now)
        .execute(&mut *tx)
        .await;
        if let Err(err) = purchase {
            tx.rollback().await?;
            if is_unique_violation(&err) {
                return Err(ReservationError::UserAlreadyPurchased);
            }
            return Err(err.into());
        }

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, reservation_id, user_id, sku_id, status,
                payment_transaction_id, payment_method, shipping_address,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id().into_uuid())
        .bind(id)
        .bind(order.user_id())
        .bind(order.sku().as_str())
        .bind(order.status().to_string())
        .bind(order.payment_transaction_id())
        .bind(order.payment_method())
        .bind(order.shipping_address())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CheckoutRecord { reservation, order })
    }

    async fn find_order_by_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Order>, ReservationError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, reservation_id, user_id, sku_id, status,
                   payment_transaction_id, payment_method, shipping_address,
                   created_at, updated_at
            FROM orders
            WHERE reservation_id = $1
            "#,
        )
        .bind(reservation_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }
}

/// Internal row type for mapping order database results
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    reservation_id: Uuid,
    user_id: Uuid,
    sku_id: String,
    status: String,
    payment_transaction_id: String,
    payment_method: String,
    shipping_address: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = ReservationError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse()?;
        Ok(Order::reconstitute(
            OrderId::from_uuid(row.id),
            ReservationId::from_uuid(row.reservation_id),
            row.user_id,
            Sku::from_string(row.sku_id),
            status,
            row.payment_transaction_id,
            row.payment_method,
            row.shipping_address,
            row.created_at,
            row.updated_at,
        ))
    }
}
