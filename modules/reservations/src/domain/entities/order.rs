// Order entity - boundary record created at checkout

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{OrderId, OrderStatus, ReservationId, Sku};

/// An order created when a reservation is confirmed. Order creation and
/// reservation confirmation commit in the same transaction; fulfillment
/// is an external workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    reservation_id: ReservationId,
    user_id: Uuid,
    sku: Sku,
    status: OrderStatus,
    payment_transaction_id: String,
    payment_method: String,
    shipping_address: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates an order for a confirmed reservation. The payment
    /// transaction already settled by the time checkout reaches the core,
    /// so orders are born confirmed.
    pub fn create(
        reservation_id: ReservationId,
        user_id: Uuid,
        sku: Sku,
        payment_transaction_id: String,
        payment_method: String,
        shipping_address: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            reservation_id,
            user_id,
            sku,
            status: OrderStatus::Confirmed,
            payment_transaction_id,
            payment_method,
            shipping_address,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitutes an Order from persistence
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: OrderId,
        reservation_id: ReservationId,
        user_id: Uuid,
        sku: Sku,
        status: OrderStatus,
        payment_transaction_id: String,
        payment_method: String,
        shipping_address: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            reservation_id,
            user_id,
            sku,
            status,
            payment_transaction_id,
            payment_method,
            shipping_address,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn reservation_id(&self) -> ReservationId {
        self.reservation_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_transaction_id(&self) -> &str {
        &self.payment_transaction_id
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
