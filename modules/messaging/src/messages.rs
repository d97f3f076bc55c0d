// Wire payloads for the reservation-requests and reservation-events topics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_quantity() -> i32 {
    1
}

/// A reservation request as published by the intake and consumed by the
/// batch allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRequestMessage {
    /// Unique id of this submit attempt
    pub request_id: Uuid,
    /// Authenticated user submitting the request
    pub user_id: Uuid,
    /// SKU being reserved; doubles as the record key for partition affinity
    pub sku_id: String,
    /// Caller-stable deduplication key
    pub idempotency_key: Uuid,
    /// Units requested; the sale only ever admits 1
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// When the intake accepted the request
    pub submitted_at: DateTime<Utc>,
}

/// Lifecycle event kinds on the reservation-events topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationEventKind {
    Created,
    Confirmed,
    Expired,
    Cancelled,
}

/// A reservation lifecycle event, keyed by SKU. Consumers must treat the
/// stream as at-least-once and deduplicate on (type, reservation_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationEventMessage {
    #[serde(rename = "type")]
    pub event: ReservationEventKind,
    pub reservation_id: Uuid,
    pub user_id: Uuid,
    pub sku_id: String,
    pub quantity: i32,
    pub occurred_at: DateTime<Utc>,
}

impl ReservationEventMessage {
    pub fn new(
        event: ReservationEventKind,
        reservation_id: Uuid,
        user_id: Uuid,
        sku_id: impl Into<String>,
        quantity: i32,
    ) -> Self {
        Self {
            event,
            reservation_id,
            user_id,
            sku_id: sku_id.into(),
            quantity,
            occurred_at: Utc::now(),
        }
    }
}
