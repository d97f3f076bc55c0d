// CancelReservationUseCase - releases a held unit at the user's request

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use cache::CoordinationCache;
use messaging::{EventBus, ReservationEventKind, ReservationEventMessage};

use crate::application::dtos::commands::CancelReservationCommand;
use crate::application::dtos::responses::ReservationResponse;
use crate::domain::repositories::ReservationRepository;
use crate::domain::value_objects::ReservationId;
use crate::ReservationError;

/// Use case for cancelling a reservation.
///
/// The status flip and the inventory release commit together in the
/// repository; the stock-cache increment, marker clear and Cancelled
/// event follow best-effort. Cancelling a confirmed reservation is a
/// refund concern and is rejected here.
pub struct CancelReservationUseCase<R, C, E>
where
    R: ReservationRepository,
    C: CoordinationCache,
    E: EventBus,
{
    reservation_repo: Arc<R>,
    cache: Arc<C>,
    events: Arc<E>,
}

impl<R, C, E> CancelReservationUseCase<R, C, E>
where
    R: ReservationRepository,
    C: CoordinationCache,
    E: EventBus,
{
    pub fn new(reservation_repo: Arc<R>, cache: Arc<C>, events: Arc<E>) -> Self {
        Self {
            reservation_repo,
            cache,
            events,
        }
    }

    /// Executes the cancellation.
    ///
    /// # Errors
    /// * `ReservationNotFound` - no such reservation
    /// * `ReservationExpired` - the hold already lapsed
    /// * `InvalidState` - the reservation is confirmed or cancelled
    pub async fn execute(
        &self,
        command: CancelReservationCommand,
    ) -> Result<ReservationResponse, ReservationError> {
        let id = ReservationId::from_uuid(command.reservation_id);
        let reservation = self.reservation_repo.cancel(id, Utc::now()).await?;

        let sku = reservation.sku().as_str();
        if let Err(err) = self.cache.adjust_stock(sku, 1).await {
            warn!(sku, error = %err, "stock cache increment failed");
        }
        if let Err(err) = self
            .cache
            .clear_active_reservation(reservation.user_id(), sku)
            .await
        {
            warn!(sku, error = %err, "active-reservation marker clear failed");
        }

        let event = ReservationEventMessage::new(
            ReservationEventKind::Cancelled,
            reservation.id().into_uuid(),
            reservation.user_id(),
            sku,
            reservation.quantity(),
        );
        if let Err(err) = self.events.publish_event(&event).await {
            warn!(sku, error = %err, "cancelled event publish failed");
        }

        Ok(ReservationResponse::from_entity(&reservation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cache::InMemoryCoordinationCache;
    use messaging::InMemoryEventBus;
    use uuid::{NoContext, Timestamp, Uuid};

    use crate::domain::entities::Reservation;
    use crate::domain::value_objects::{IdempotencyKey, Sku};
    use crate::test_support::InMemoryStore;

    fn use_case(
        store: &Arc<InMemoryStore>,
        cache: &Arc<InMemoryCoordinationCache>,
        events: &Arc<InMemoryEventBus>,
    ) -> CancelReservationUseCase<InMemoryStore, InMemoryCoordinationCache, InMemoryEventBus> {
        CancelReservationUseCase::new(store.clone(), cache.clone(), events.clone())
    }

    fn new_user() -> Uuid {
        Uuid::new_v7(Timestamp::now(NoContext))
    }

    fn active_reservation(user: Uuid, sku: &str) -> Reservation {
        Reservation::create(
            user,
            Sku::from_string(sku.to_string()),
            IdempotencyKey::derive(user, sku, None),
            Utc::now(),
            chrono::Duration::seconds(120),
        )
    }

    #[tokio::test]
    async fn test_cancel_releases_unit() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-A", 5);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());

        let reservation = active_reservation(new_user(), "SKU-A");
        let reservation_id = reservation.id().into_uuid();
        store.insert_reservation(reservation);
        assert_eq!(store.inventory_snapshot("SKU-A").unwrap().available(), 4);

        let response = use_case(&store, &cache, &events)
            .execute(CancelReservationCommand { reservation_id })
            .await
            .unwrap();

        assert_eq!(response.status, "cancelled");
        assert!(response.cancelled_at.is_some());

        let inventory = store.inventory_snapshot("SKU-A").unwrap();
        assert_eq!(inventory.reserved_count(), 0);
        assert_eq!(inventory.available(), 5);

        let published = events.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event, ReservationEventKind::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_unknown_reservation() {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());

        let result = use_case(&store, &cache, &events)
            .execute(CancelReservationCommand {
                reservation_id: Uuid::new_v7(Timestamp::now(NoContext)),
            })
            .await;

        assert!(matches!(
            result,
            Err(ReservationError::ReservationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_expired_reservation() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-B", 5);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());

        let mut reservation = active_reservation(new_user(), "SKU-B");
        reservation.expire(Utc::now()).unwrap();
        let reservation_id = reservation.id().into_uuid();
        store.insert_reservation(reservation);

        let result = use_case(&store, &cache, &events)
            .execute(CancelReservationCommand { reservation_id })
            .await;

        assert!(matches!(result, Err(ReservationError::ReservationExpired)));
        assert!(events.published().is_empty());
    }
}
