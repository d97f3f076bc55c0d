// ReservationRepository trait - reservation lookups and lifecycle writes

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::Reservation;
use crate::domain::value_objects::{IdempotencyKey, ReservationId, Sku};
use crate::ReservationError;

/// Outcome of an expiry attempt on a single reservation.
#[derive(Debug, Clone)]
pub enum ExpiryOutcome {
    /// The row was transitioned and its unit released
    Expired(Reservation),
    /// Another path won the race; nothing was changed
    AlreadyTerminal,
}

/// Reservation persistence. `expire` and `cancel` are atomic with the
/// matching inventory release.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Finds a reservation by its unique ID
    async fn find_by_id(&self, id: ReservationId)
        -> Result<Option<Reservation>, ReservationError>;

    /// Finds a reservation by its idempotency key. This is how the intake
    /// poll loop and the allocator's duplicate check see prior attempts.
    async fn find_by_idempotency_key(
        &self,
        key: IdempotencyKey,
    ) -> Result<Option<Reservation>, ReservationError>;

    /// Finds the user's reserved-or-confirmed reservation on a SKU, if
    /// any. At most one can exist.
    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        sku: &Sku,
    ) -> Result<Option<Reservation>, ReservationError>;

    /// Returns up to `limit` reservations past their deadline, oldest
    /// deadline first.
    async fn find_expired(&self, limit: i64) -> Result<Vec<Reservation>, ReservationError>;

    /// Transitions a reservation to expired and releases its unit, in one
    /// transaction. Skips without side effects when another path already
    /// finalized the row.
    async fn expire(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<ExpiryOutcome, ReservationError>;

    /// Transitions a reservation to cancelled and releases its unit, in
    /// one transaction.
    ///
    /// # Errors
    /// * `ReservationNotFound` - no such reservation
    /// * `ReservationExpired` - the row is already expired
    /// * `InvalidState` - the row is confirmed or cancelled
    async fn cancel(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ReservationError>;
}
