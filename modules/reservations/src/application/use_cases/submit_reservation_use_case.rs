// SubmitReservationUseCase - the request intake
//
// Publishes a request onto the partitioned bus and polls the rejection
// channel and the store until an outcome is visible or the deadline
// passes. Inventory is never touched here; the allocator decides.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::{NoContext, Timestamp, Uuid};

use cache::CoordinationCache;
use messaging::{RequestBus, ReservationRequestMessage};

use crate::application::dtos::commands::SubmitReservationCommand;
use crate::application::dtos::responses::{ReservationResponse, SubmitOutcome};
use crate::domain::repositories::ReservationRepository;
use crate::domain::value_objects::{IdempotencyKey, Sku};
use crate::{RejectionReason, ReservationError};

/// Intake tunables.
#[derive(Debug, Clone)]
pub struct SubmitSettings {
    /// Client-visible deadline for resolving an outcome
    pub deadline: Duration,
    /// Interval between polls of the rejection channel and the store
    pub poll_interval: Duration,
}

/// Use case for submitting a reservation request.
///
/// Pre-checks against the cache are advisory and fall open on cache
/// faults; the allocator re-validates authoritatively against the store.
pub struct SubmitReservationUseCase<R, C, B>
where
    R: ReservationRepository,
    C: CoordinationCache,
    B: RequestBus,
{
    reservation_repo: Arc<R>,
    cache: Arc<C>,
    bus: Arc<B>,
    settings: SubmitSettings,
}

impl<R, C, B> SubmitReservationUseCase<R, C, B>
where
    R: ReservationRepository,
    C: CoordinationCache,
    B: RequestBus,
{
    pub fn new(reservation_repo: Arc<R>, cache: Arc<C>, bus: Arc<B>, settings: SubmitSettings) -> Self {
        Self {
            reservation_repo,
            cache,
            bus,
            settings,
        }
    }

    /// Executes the submit flow.
    ///
    /// # Errors
    /// * `InvalidSku` - the SKU failed shape validation
    /// * `TemporarilyUnavailable` - the bus publish failed after retries
    pub async fn execute(
        &self,
        command: SubmitReservationCommand,
    ) -> Result<SubmitOutcome, ReservationError> {
        let sku = Sku::new(command.sku_id.clone())?;
        let key = IdempotencyKey::derive(
            command.user_id,
            sku.as_str(),
            command.request_nonce.as_deref(),
        );

        // A retry with the same key resolves to the existing reservation.
        if let Some(existing) = self.reservation_repo.find_by_idempotency_key(key).await? {
            return Ok(SubmitOutcome::Accepted(ReservationResponse::from_entity(
                &existing,
            )));
        }

        if let Some(rejection) = self.advisory_pre_checks(command.user_id, &sku).await {
            return Ok(SubmitOutcome::Rejected(rejection));
        }

        let message = ReservationRequestMessage {
            request_id: Uuid::new_v7(Timestamp::now(NoContext)),
            user_id: command.user_id,
            sku_id: sku.as_str().to_string(),
            idempotency_key: key.into_uuid(),
            quantity: 1,
            submitted_at: Utc::now(),
        };
        self.bus
            .publish_request(&message)
            .await
            .map_err(|err| ReservationError::TemporarilyUnavailable(err.to_string()))?;

        self.poll_for_outcome(command.user_id, &sku, key).await
    }

    /// Best-effort cache pre-checks. Any cache fault skips the check; the
    /// allocator is the authority.
    async fn advisory_pre_checks(&self, user_id: Uuid, sku: &Sku) -> Option<RejectionReason> {
        if let Ok(true) = self.cache.user_purchased(user_id, sku.as_str()).await {
            return Some(RejectionReason::UserAlreadyPurchased);
        }
        // The idempotency lookup above already resolved this attempt's own
        // reservation, so any marker here belongs to a different attempt.
        if let Ok(Some(_)) = self.cache.active_reservation(user_id, sku.as_str()).await {
            return Some(RejectionReason::UserHasActiveReservation);
        }
        if let Ok(Some(stock)) = self.cache.stock(sku.as_str()).await {
            if stock <= 0 {
                return Some(RejectionReason::OutOfStock);
            }
        }
        None
    }

    /// Polls until the allocator's outcome is visible. First to return
    /// wins; on deadline the caller gets Pending and may retry with the
    /// same idempotency key.
    async fn poll_for_outcome(
        &self,
        user_id: Uuid,
        sku: &Sku,
        key: IdempotencyKey,
    ) -> Result<SubmitOutcome, ReservationError> {
        let deadline = tokio::time::Instant::now() + self.settings.deadline;

        loop {
            if let Some(reservation) = self.reservation_repo.find_by_idempotency_key(key).await? {
                return Ok(SubmitOutcome::Accepted(ReservationResponse::from_entity(
                    &reservation,
                )));
            }

            if let Ok(Some(marker)) = self.cache.rejection(user_id, sku.as_str()).await {
                if let Some(reason) = RejectionReason::from_marker(&marker) {
                    return Ok(SubmitOutcome::Rejected(reason));
                }
            }

            if tokio::time::Instant::now() + self.settings.poll_interval >= deadline {
                return Ok(SubmitOutcome::Pending);
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}
