// Reservation entity - a time-bounded hold of one unit for a user

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{IdempotencyKey, ReservationId, ReservationStatus, Sku};
use crate::ReservationError;

/// A user's hold on one unit of a SKU.
///
/// Created only by the batch allocator. Transitions out of `Reserved` go
/// through the confirm, cancel or expiry paths; each one is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    user_id: Uuid,
    sku: Sku,
    quantity: i32,
    status: ReservationStatus,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    expired_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    idempotency_key: IdempotencyKey,
}

impl Reservation {
    /// Creates a new hold. `hold` is the sale's configured hold duration.
    pub fn create(
        user_id: Uuid,
        sku: Sku,
        idempotency_key: IdempotencyKey,
        now: DateTime<Utc>,
        hold: Duration,
    ) -> Self {
        Self {
            id: ReservationId::new(),
            user_id,
            sku,
            quantity: 1,
            status: ReservationStatus::Reserved,
            created_at: now,
            expires_at: now + hold,
            confirmed_at: None,
            expired_at: None,
            cancelled_at: None,
            idempotency_key,
        }
    }

    /// Reconstitutes a Reservation from persistence
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ReservationId,
        user_id: Uuid,
        sku: Sku,
        quantity: i32,
        status: ReservationStatus,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        confirmed_at: Option<DateTime<Utc>>,
        expired_at: Option<DateTime<Utc>>,
        cancelled_at: Option<DateTime<Utc>>,
        idempotency_key: IdempotencyKey,
    ) -> Self {
        Self {
            id,
            user_id,
            sku,
            quantity,
            status,
            created_at,
            expires_at,
            confirmed_at,
            expired_at,
            cancelled_at,
            idempotency_key,
        }
    }

    /// Consumes the hold at checkout.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<(), ReservationError> {
        match self.status {
            ReservationStatus::Reserved if now < self.expires_at => {
                self.status = ReservationStatus::Confirmed;
                self.confirmed_at = Some(now);
                Ok(())
            }
            ReservationStatus::Reserved | ReservationStatus::Expired => {
                Err(ReservationError::ReservationExpired)
            }
            _ => Err(ReservationError::InvalidState),
        }
    }

    /// Releases the hold at the user's request.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), ReservationError> {
        match self.status {
            ReservationStatus::Reserved => {
                self.status = ReservationStatus::Cancelled;
                self.cancelled_at = Some(now);
                Ok(())
            }
            ReservationStatus::Expired => Err(ReservationError::ReservationExpired),
            _ => Err(ReservationError::InvalidState),
        }
    }

    /// Lapses the hold once past its deadline.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<(), ReservationError> {
        match self.status {
            ReservationStatus::Reserved => {
                self.status = ReservationStatus::Expired;
                self.expired_at = Some(now);
                Ok(())
            }
            _ => Err(ReservationError::InvalidState),
        }
    }

    /// Returns true when the hold is past its deadline but not yet swept
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Reserved && now >= self.expires_at
    }

    /// Returns true while the reservation holds a unit
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn expired_at(&self) -> Option<DateTime<Utc>> {
        self.expired_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn idempotency_key(&self) -> IdempotencyKey {
        self.idempotency_key
    }
}
