// Response DTOs for the reservation pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Order, Reservation};
use crate::RejectionReason;

/// Response for a single reservation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sku_id: String,
    pub quantity: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Present once the reservation was confirmed into an order
    pub order_id: Option<Uuid>,
}

impl ReservationResponse {
    pub fn from_entity(reservation: &Reservation) -> Self {
        Self {
            id: reservation.id().into_uuid(),
            user_id: reservation.user_id(),
            sku_id: reservation.sku().as_str().to_string(),
            quantity: reservation.quantity(),
            status: reservation.status().to_string(),
            created_at: reservation.created_at(),
            expires_at: reservation.expires_at(),
            confirmed_at: reservation.confirmed_at(),
            expired_at: reservation.expired_at(),
            cancelled_at: reservation.cancelled_at(),
            order_id: None,
        }
    }

    pub fn with_order(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

/// Response for an order created at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub user_id: Uuid,
    pub sku_id: String,
    pub status: String,
    pub payment_transaction_id: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

impl OrderResponse {
    pub fn from_entity(order: &Order) -> Self {
        Self {
            id: order.id().into_uuid(),
            reservation_id: order.reservation_id().into_uuid(),
            user_id: order.user_id(),
            sku_id: order.sku().as_str().to_string(),
            status: order.status().to_string(),
            payment_transaction_id: order.payment_transaction_id().to_string(),
            payment_method: order.payment_method().to_string(),
            created_at: order.created_at(),
        }
    }
}

/// Availability snapshot for one SKU
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub sku_id: String,
    pub available: i64,
    pub total: i64,
    pub active: bool,
}

/// Outcome of a submit attempt, resolved within the intake deadline.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The allocator created (or had already created) the reservation
    Accepted(ReservationResponse),
    /// The request was rejected with a specific reason
    Rejected(RejectionReason),
    /// The deadline passed before an outcome was visible; the caller may
    /// retry with the same idempotency key
    Pending,
}
