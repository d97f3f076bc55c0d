// CheckoutUseCase - confirms a reservation and records the order

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use cache::CoordinationCache;
use messaging::{EventBus, ReservationEventKind, ReservationEventMessage};

use crate::application::dtos::commands::CheckoutCommand;
use crate::application::dtos::responses::OrderResponse;
use crate::domain::repositories::{CheckoutRepository, ConfirmCheckout};
use crate::domain::value_objects::ReservationId;
use crate::ReservationError;

/// Use case for the checkout path.
///
/// The confirm transaction (status flip, inventory reserved -> sold,
/// purchase record, order insert) commits as one unit in the repository.
/// Cache updates and the Confirmed event are post-commit and best-effort.
pub struct CheckoutUseCase<K, C, E>
where
    K: CheckoutRepository,
    C: CoordinationCache,
    E: EventBus,
{
    checkout_repo: Arc<K>,
    cache: Arc<C>,
    events: Arc<E>,
    purchased_ttl: Duration,
}

impl<K, C, E> CheckoutUseCase<K, C, E>
where
    K: CheckoutRepository,
    C: CoordinationCache,
    E: EventBus,
{
    pub fn new(checkout_repo: Arc<K>, cache: Arc<C>, events: Arc<E>, purchased_ttl: Duration) -> Self {
        Self {
            checkout_repo,
            cache,
            events,
            purchased_ttl,
        }
    }

    /// Executes the checkout.
    ///
    /// # Errors
    /// * `ReservationNotFound` - no such reservation
    /// * `ReservationExpired` - the hold lapsed before checkout
    /// * `InvalidState` - the reservation is not in the reserved state
    /// * `UserAlreadyPurchased` - the purchase record already exists
    pub async fn execute(&self, command: CheckoutCommand) -> Result<OrderResponse, ReservationError> {
        let checkout = ConfirmCheckout {
            reservation_id: ReservationId::from_uuid(command.reservation_id),
            payment_transaction_id: command.payment_transaction_id,
            payment_method: command.payment_method,
            shipping_address: command.shipping_address,
            now: Utc::now(),
        };

        let record = self.checkout_repo.confirm(&checkout).await?;

        let reservation = &record.reservation;
        let sku = reservation.sku().as_str();

        // The unit moved reserved -> sold, so the cached stock count is
        // already right; only the markers change.
        if let Err(err) = self
            .cache
            .clear_active_reservation(reservation.user_id(), sku)
            .await
        {
            warn!(sku, error = %err, "active-reservation marker clear failed");
        }
        if let Err(err) = self
            .cache
            .set_user_purchased(reservation.user_id(), sku, self.purchased_ttl)
            .await
        {
            warn!(sku, error = %err, "user-purchased marker write failed");
        }

        let event = ReservationEventMessage::new(
            ReservationEventKind::Confirmed,
            reservation.id().into_uuid(),
            reservation.user_id(),
            sku,
            reservation.quantity(),
        );
        if let Err(err) = self.events.publish_event(&event).await {
            warn!(sku, error = %err, "confirmed event publish failed");
        }

        Ok(OrderResponse::from_entity(&record.order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cache::InMemoryCoordinationCache;
    use messaging::InMemoryEventBus;
    use uuid::{NoContext, Timestamp, Uuid};

    use crate::domain::entities::Reservation;
    use crate::domain::value_objects::{IdempotencyKey, ReservationStatus, Sku};
    use crate::test_support::InMemoryStore;

    fn use_case(
        store: &Arc<InMemoryStore>,
        cache: &Arc<InMemoryCoordinationCache>,
        events: &Arc<InMemoryEventBus>,
    ) -> CheckoutUseCase<InMemoryStore, InMemoryCoordinationCache, InMemoryEventBus> {
        CheckoutUseCase::new(
            store.clone(),
            cache.clone(),
            events.clone(),
            Duration::from_secs(86_400),
        )
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

    fn command(reservation_id: Uuid) -> CheckoutCommand {
        CheckoutCommand {
            reservation_id,
            payment_transaction_id: "tx-001".to_string(),
            payment_method: "card".to_string(),
            shipping_address: "1 Main St".to_string(),
        }
    }

    fn new_user() -> Uuid {
        Uuid::new_v7(Timestamp::now(NoContext))
    }

    #[tokio::test]
    async fn test_checkout_confirms_and_records_order() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-A", 5);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());

        let user = new_user();
        let reservation = active_reservation(user, "SKU-A");
        let reservation_id = reservation.id().into_uuid();
        store.insert_reservation(reservation);

        let order = use_case(&store, &cache, &events)
            .execute(command(reservation_id))
            .await
            .unwrap();

        assert_eq!(order.reservation_id, reservation_id);
        assert_eq!(order.status, "confirmed");

        // reserved -> sold; availability unchanged by confirmation.
        let inventory = store.inventory_snapshot("SKU-A").unwrap();
        assert_eq!(inventory.reserved_count(), 0);
        assert_eq!(inventory.sold_count(), 1);
        assert_eq!(inventory.available(), 4);

        assert_eq!(
            store
                .reservations_with_status(ReservationStatus::Confirmed)
                .len(),
            1
        );

        let published = events.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event, ReservationEventKind::Confirmed);

        // Purchase marker set for the intake pre-checks.
        assert!(cache.user_purchased(user, "SKU-A").await.unwrap());
    }

    #[tokio::test]
    async fn test_checkout_unknown_reservation() {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());

        let result = use_case(&store, &cache, &events)
            .execute(command(Uuid::new_v7(Timestamp::now(NoContext))))
            .await;

        assert!(matches!(
            result,
            Err(ReservationError::ReservationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_checkout_expired_reservation() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-B", 5);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());

        let user = new_user();
        let reservation = Reservation::create(
            user,
            Sku::from_string("SKU-B".to_string()),
            IdempotencyKey::derive(user, "SKU-B", None),
            Utc::now() - chrono::Duration::seconds(300),
            chrono::Duration::seconds(120),
        );
        let reservation_id = reservation.id().into_uuid();
        store.insert_reservation(reservation);

        let result = use_case(&store, &cache, &events)
            .execute(command(reservation_id))
            .await;

        assert!(matches!(result, Err(ReservationError::ReservationExpired)));
        assert!(events.published().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_twice_rejected() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-C", 5);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());

        let user = new_user();
        let reservation = active_reservation(user, "SKU-C");
        let reservation_id = reservation.id().into_uuid();
        store.insert_reservation(reservation);

        let use_case = use_case(&store, &cache, &events);
        use_case.execute(command(reservation_id)).await.unwrap();

        let result = use_case.execute(command(reservation_id)).await;
        assert!(matches!(result, Err(ReservationError::InvalidState)));

        // The counters did not move twice.
        let inventory = store.inventory_snapshot("SKU-C").unwrap();
        assert_eq!(inventory.sold_count(), 1);
    }

    #[tokio::test]
    async fn test_checkout_race_with_expiry_single_winner() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-D", 5);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());

        let user = new_user();
        let reservation = active_reservation(user, "SKU-D");
        let id = reservation.id();
        store.insert_reservation(reservation);

        // Checkout wins the race; the reconciler's attempt then finds a
        // terminal row and must skip without side effects.
        use_case(&store, &cache, &events)
            .execute(command(id.into_uuid()))
            .await
            .unwrap();

        use crate::domain::repositories::{ExpiryOutcome, ReservationRepository};
        let outcome = store.expire(id, Utc::now()).await.unwrap();
        assert!(matches!(outcome, ExpiryOutcome::AlreadyTerminal));

        let inventory = store.inventory_snapshot("SKU-D").unwrap();
        // reserved + sold conserved: exactly one unit accounted once.
        assert_eq!(inventory.reserved_count() + inventory.sold_count(), 1);
    }
}
