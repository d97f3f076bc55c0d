// GetReservationUseCase - fetches a reservation, with its order if confirmed

use std::sync::Arc;

use uuid::Uuid;

use crate::application::dtos::responses::ReservationResponse;
use crate::domain::repositories::{CheckoutRepository, ReservationRepository};
use crate::domain::value_objects::{ReservationId, ReservationStatus};
use crate::ReservationError;

pub struct GetReservationUseCase<R, K>
where
    R: ReservationRepository,
    K: CheckoutRepository,
{
    reservation_repo: Arc<R>,
    checkout_repo: Arc<K>,
}

impl<R, K> GetReservationUseCase<R, K>
where
    R: ReservationRepository,
    K: CheckoutRepository,
{
    pub fn new(reservation_repo: Arc<R>, checkout_repo: Arc<K>) -> Self {
        Self {
            reservation_repo,
            checkout_repo,
        }
    }

    pub async fn execute(&self, reservation_id: Uuid) -> Result<ReservationResponse, ReservationError> {
        let id = ReservationId::from_uuid(reservation_id);
        let reservation = self
            .reservation_repo
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::ReservationNotFound(reservation_id))?;

        let mut response = ReservationResponse::from_entity(&reservation);
        if reservation.status() == ReservationStatus::Confirmed {
            if let Some(order) = self.checkout_repo.find_order_by_reservation(id).await? {
                response = response.with_order(order.id().into_uuid());
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use uuid::{NoContext, Timestamp};

    use crate::domain::entities::Reservation;
    use crate::domain::repositories::{CheckoutRepository, ConfirmCheckout};
    use crate::domain::value_objects::{IdempotencyKey, Sku};
    use crate::test_support::InMemoryStore;

    fn new_user() -> Uuid {
        Uuid::new_v7(Timestamp::now(NoContext))
    }

    #[tokio::test]
    async fn test_get_reservation() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-A", 5);
        let user = new_user();
        let reservation = Reservation::create(
            user,
            Sku::from_string("SKU-A".to_string()),
            IdempotencyKey::derive(user, "SKU-A", None),
            Utc::now(),
            chrono::Duration::seconds(120),
        );
        let id = reservation.id().into_uuid();
        store.insert_reservation(reservation);

        let use_case = GetReservationUseCase::new(store.clone(), store.clone());
        let response = use_case.execute(id).await.unwrap();
        assert_eq!(response.id, id);
        assert_eq!(response.status, "reserved");
        assert!(response.order_id.is_none());
    }

    #[tokio::test]
    async fn test_get_confirmed_reservation_includes_order() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-B", 5);
        let user = new_user();
        let reservation = Reservation::create(
            user,
            Sku::from_string("SKU-B".to_string()),
            IdempotencyKey::derive(user, "SKU-B", None),
            Utc::now(),
            chrono::Duration::seconds(120),
        );
        let id = reservation.id();
        store.insert_reservation(reservation);

        let record = store
            .confirm(&ConfirmCheckout {
                reservation_id: id,
                payment_transaction_id: "tx-1".to_string(),
                payment_method: "card".to_string(),
                shipping_address: "1 Main St".to_string(),
                now: Utc::now(),
            })
            .await
            .unwrap();

        let use_case = GetReservationUseCase::new(store.clone(), store.clone());
        let response = use_case.execute(id.into_uuid()).await.unwrap();
        assert_eq!(response.status, "confirmed");
        assert_eq!(response.order_id, Some(record.order.id().into_uuid()));
    }

    #[tokio::test]
    async fn test_get_missing_reservation() {
        let store = Arc::new(InMemoryStore::new());
        let use_case = GetReservationUseCase::new(store.clone(), store.clone());
        let result = use_case
            .execute(Uuid::new_v7(Timestamp::now(NoContext)))
            .await;
        assert!(matches!(
            result,
            Err(ReservationError::ReservationNotFound(_))
        ));
    }
}
