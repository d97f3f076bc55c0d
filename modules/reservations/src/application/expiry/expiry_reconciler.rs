// ExpiryReconciler - authoritative sweep over lapsed reservations
//
// Layer 2 of the three-layer expiry design. Layer 1 is the cache TTL on
// active-reservation markers (client-visible, volatile); layer 3 is the
// Expired event published for downstream consumers. This sweep is the one
// that actually releases units.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use cache::CoordinationCache;
use messaging::{EventBus, ReservationEventKind, ReservationEventMessage};

use crate::domain::repositories::{ExpiryOutcome, ReservationRepository};
use crate::ReservationError;

/// Result of one reconciler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Rows transitioned to expired
    pub expired: usize,
    /// Rows another path finalized first
    pub skipped: usize,
    /// Rows whose transaction failed; retried next run
    pub failed: usize,
}

/// Periodically expires reservations past their deadline and releases
/// their units. One row per transaction keeps critical sections short,
/// since the allocator's conditional update contends on the same
/// inventory rows.
pub struct ExpiryReconciler<R, C, E>
where
    R: ReservationRepository,
    C: CoordinationCache,
    E: EventBus,
{
    reservation_repo: Arc<R>,
    cache: Arc<C>,
    events: Arc<E>,
    sweep_batch: i64,
}

impl<R, C, E> ExpiryReconciler<R, C, E>
where
    R: ReservationRepository,
    C: CoordinationCache,
    E: EventBus,
{
    pub fn new(reservation_repo: Arc<R>, cache: Arc<C>, events: Arc<E>, sweep_batch: i64) -> Self {
        Self {
            reservation_repo,
            cache,
            events,
            sweep_batch,
        }
    }

    /// Runs sweeps forever with a fixed delay between runs. A run always
    /// completes before the next is scheduled.
    pub async fn run(&self, interval: Duration) {
        loop {
            match self.run_once().await {
                Ok(report) if report.expired > 0 || report.failed > 0 => {
                    info!(
                        expired = report.expired,
                        skipped = report.skipped,
                        failed = report.failed,
                        "expiry sweep completed"
                    );
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "expiry sweep failed"),
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Sweeps one batch of lapsed reservations.
    pub async fn run_once(&self) -> Result<SweepReport, ReservationError> {
        let candidates = self.reservation_repo.find_expired(self.sweep_batch).await?;
        let mut report = SweepReport::default();

        for candidate in candidates {
            let now = Utc::now();
            match self.reservation_repo.expire(candidate.id(), now).await {
                Ok(ExpiryOutcome::Expired(reservation)) => {
                    report.expired += 1;
                    self.publish_expiry(&reservation).await;
                }
                Ok(ExpiryOutcome::AlreadyTerminal) => report.skipped += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        reservation_id = %candidate.id(),
                        error = %err,
                        "expiry transaction failed; will retry next sweep"
                    );
                }
            }
        }

        Ok(report)
    }

    /// Post-commit side effects. Failures are logged; the expiry stands.
    async fn publish_expiry(&self, reservation: &crate::domain::entities::Reservation) {
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
            ReservationEventKind::Expired,
            reservation.id().into_uuid(),
            reservation.user_id(),
            sku,
            reservation.quantity(),
        );
        if let Err(err) = self.events.publish_event(&event).await {
            warn!(sku, error = %err, "expired event publish failed");
        }
    }
}
