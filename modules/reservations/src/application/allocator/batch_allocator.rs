// BatchAllocator - the single writer per SKU
//
// Consumes one bus batch at a time, groups requests by SKU in arrival
// order, validates each request, and performs the two-phase conditional
// allocation. This is the only place reserve-side inventory writes and
// reservation inserts happen.
//
// Correctness rests on three legs: one consumer per partition, the
// `available_count >= K` predicate inside AllocationStore, and the unique
// idempotency-key constraint. No locks span across batches.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use cache::CoordinationCache;
use messaging::{EventBus, ReservationEventKind, ReservationEventMessage, ReservationRequestMessage};

use crate::domain::entities::Reservation;
use crate::domain::repositories::{
    AllocationReceipt, AllocationStore, InventoryRepository, ReservationRepository,
    UserPurchaseRepository,
};
use crate::domain::value_objects::{IdempotencyKey, Sku};
use crate::{RejectionReason, ReservationError};

/// Tunables the allocator needs per batch.
#[derive(Debug, Clone)]
pub struct AllocatorSettings {
    /// Reservation hold window
    pub hold: chrono::Duration,
    /// TTL on rejection markers
    pub rejection_ttl: Duration,
    /// TTL on active-reservation markers (hold + margin)
    pub active_reservation_ttl: Duration,
}

/// Counters reported per processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub allocated: usize,
    pub rejected: usize,
    pub oversell_alarms: usize,
}

impl BatchOutcome {
    fn absorb(&mut self, other: BatchOutcome) {
        self.allocated += other.allocated;
        self.rejected += other.rejected;
        self.oversell_alarms += other.oversell_alarms;
    }
}

/// Groups requests by SKU, preserving arrival order within each group.
/// Arrival order within a batch defines FIFO among contenders.
pub(crate) fn group_by_sku(
    requests: &[ReservationRequestMessage],
) -> Vec<(String, Vec<&ReservationRequestMessage>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<&ReservationRequestMessage>> =
        std::collections::HashMap::new();
    for request in requests {
        if !groups.contains_key(&request.sku_id) {
            order.push(request.sku_id.clone());
        }
        groups.entry(request.sku_id.clone()).or_default().push(request);
    }
    order
        .into_iter()
        .map(|sku| {
            let group = groups.remove(&sku).unwrap_or_default();
            (sku, group)
        })
        .collect()
}

/// The batch allocator. One instance per worker; each worker owns its
/// partitions exclusively, so per-SKU processing is single-writer.
pub struct BatchAllocator<A, I, R, P, C, E>
where
    A: AllocationStore,
    I: InventoryRepository,
    R: ReservationRepository,
    P: UserPurchaseRepository,
    C: CoordinationCache,
    E: EventBus,
{
    allocation_store: Arc<A>,
    inventory_repo: Arc<I>,
    reservation_repo: Arc<R>,
    user_purchase_repo: Arc<P>,
    cache: Arc<C>,
    events: Arc<E>,
    settings: AllocatorSettings,
}

impl<A, I, R, P, C, E> BatchAllocator<A, I, R, P, C, E>
where
    A: AllocationStore,
    I: InventoryRepository,
    R: ReservationRepository,
    P: UserPurchaseRepository,
    C: CoordinationCache,
    E: EventBus,
{
    pub fn new(
        allocation_store: Arc<A>,
        inventory_repo: Arc<I>,
        reservation_repo: Arc<R>,
        user_purchase_repo: Arc<P>,
        cache: Arc<C>,
        events: Arc<E>,
        settings: AllocatorSettings,
    ) -> Self {
        Self {
            allocation_store,
            inventory_repo,
            reservation_repo,
            user_purchase_repo,
            cache,
            events,
            settings,
        }
    }

    /// Processes one bus batch.
    ///
    /// Validation and allocation rejections are recorded per row and never
    /// abort the batch. A store failure aborts with `Err`: the caller must
    /// not acknowledge the batch, and redelivery re-runs everything with
    /// the idempotency keys deduplicating prior inserts.
    pub async fn process_batch(
        &self,
        requests: &[ReservationRequestMessage],
    ) -> Result<BatchOutcome, ReservationError> {
        let mut outcome = BatchOutcome::default();
        for (sku_raw, group) in group_by_sku(requests) {
            match Sku::new(sku_raw) {
                Ok(sku) => {
                    let group_outcome = self.process_sku_group(&sku, &group).await?;
                    outcome.absorb(group_outcome);
                }
                Err(_) => {
                    for request in &group {
                        self.record_rejection(
                            request.user_id,
                            &request.sku_id,
                            RejectionReason::InvalidRequest,
                        )
                        .await;
                        outcome.rejected += 1;
                    }
                }
            }
        }
        Ok(outcome)
    }

    async fn process_sku_group(
        &self,
        sku: &Sku,
        group: &[&ReservationRequestMessage],
    ) -> Result<BatchOutcome, ReservationError> {
        let now = Utc::now();
        let mut outcome = BatchOutcome::default();
        let mut rejections: Vec<(Uuid, RejectionReason)> = Vec::new();
        let mut drafts: Vec<Reservation> = Vec::new();
        let mut seen_keys: HashSet<IdempotencyKey> = HashSet::new();
        let mut seen_users: HashSet<Uuid> = HashSet::new();

        // Validate in arrival order; order among survivors defines who
        // wins when only part of the group fits.
        for request in group {
            match self
                .validate_request(sku, request, &seen_keys, &seen_users)
                .await?
            {
                Some(reason) => rejections.push((request.user_id, reason)),
                None => {
                    let key = IdempotencyKey::from_uuid(request.idempotency_key);
                    seen_keys.insert(key);
                    seen_users.insert(request.user_id);
                    drafts.push(Reservation::create(
                        request.user_id,
                        sku.clone(),
                        key,
                        now,
                        self.settings.hold,
                    ));
                }
            }
        }

        let receipt = if drafts.is_empty() {
            None
        } else {
            self.allocate_two_phase(sku, &drafts, &mut rejections).await?
        };

        if let Some(receipt) = receipt {
            outcome.allocated = receipt.allocated.len();
            for duplicate in &receipt.duplicates {
                rejections.push((duplicate.user_id(), RejectionReason::DuplicateRequest));
            }
            self.publish_allocations(sku, &receipt).await;
        }

        outcome.rejected = rejections.len();
        for (user_id, reason) in &rejections {
            self.record_rejection(*user_id, sku.as_str(), *reason).await;
        }

        self.oversell_probe(sku, &mut outcome).await;
        Ok(outcome)
    }

    /// Returns the rejection reason, or None for a survivor.
    async fn validate_request(
        &self,
        sku: &Sku,
        request: &ReservationRequestMessage,
        seen_keys: &HashSet<IdempotencyKey>,
        seen_users: &HashSet<Uuid>,
    ) -> Result<Option<RejectionReason>, ReservationError> {
        if request.quantity != 1 {
            return Ok(Some(RejectionReason::InvalidRequest));
        }

        let key = IdempotencyKey::from_uuid(request.idempotency_key);
        if seen_keys.contains(&key) {
            return Ok(Some(RejectionReason::DuplicateRequest));
        }
        if self
            .reservation_repo
            .find_by_idempotency_key(key)
            .await?
            .is_some()
        {
            return Ok(Some(RejectionReason::DuplicateRequest));
        }

        if seen_users.contains(&request.user_id) {
            return Ok(Some(RejectionReason::UserHasActiveReservation));
        }

        // Cache answers are trusted when positive (only this pipeline
        // writes them); on a miss or a cache fault the store decides.
        let purchased = match self.cache.user_purchased(request.user_id, sku.as_str()).await {
            Ok(true) => true,
            Ok(false) | Err(_) => {
                self.user_purchase_repo
                    .exists(request.user_id, sku)
                    .await?
            }
        };
        if purchased {
            return Ok(Some(RejectionReason::UserAlreadyPurchased));
        }

        let has_active = match self
            .cache
            .active_reservation(request.user_id, sku.as_str())
            .await
        {
            Ok(Some(_)) => true,
            Ok(None) | Err(_) => self
                .reservation_repo
                .find_active_for_user(request.user_id, sku)
                .await?
                .is_some(),
        };
        if has_active {
            return Ok(Some(RejectionReason::UserHasActiveReservation));
        }

        Ok(None)
    }

    /// Two-phase conditional allocation: try the whole group, and on a
    /// guard failure retry once with what the re-read says still fits.
    /// At most two inventory writes per SKU per batch.
    async fn allocate_two_phase(
        &self,
        sku: &Sku,
        drafts: &[Reservation],
        rejections: &mut Vec<(Uuid, RejectionReason)>,
    ) -> Result<Option<AllocationReceipt>, ReservationError> {
        if let Some(receipt) = self.allocation_store.try_allocate(sku, drafts).await? {
            return Ok(Some(receipt));
        }

        let available = self
            .inventory_repo
            .find_by_sku(sku)
            .await?
            .map(|inventory| inventory.available())
            .unwrap_or(0);

        if available <= 0 {
            for draft in drafts {
                rejections.push((draft.user_id(), RejectionReason::OutOfStock));
            }
            return Ok(None);
        }

        let fit = (available as usize).min(drafts.len());
        for draft in &drafts[fit..] {
            rejections.push((draft.user_id(), RejectionReason::OutOfStock));
        }

        match self.allocation_store.try_allocate(sku, &drafts[..fit]).await? {
            Some(receipt) => Ok(Some(receipt)),
            None => {
                // Inventory moved between the re-read and the retry; the
                // losers see the true state on their next attempt.
                for draft in &drafts[..fit] {
                    rejections.push((draft.user_id(), RejectionReason::OutOfStock));
                }
                Ok(None)
            }
        }
    }

    /// Post-commit side effects for allocated rows. Best-effort: the
    /// commit already stands, failures are logged and skipped.
    async fn publish_allocations(&self, sku: &Sku, receipt: &AllocationReceipt) {
        let allocated = receipt.allocated.len() as i64;
        if allocated > 0 {
            if let Err(err) = self.cache.adjust_stock(sku.as_str(), -allocated).await {
                warn!(sku = %sku, error = %err, "stock cache decrement failed");
            }
        }

        for reservation in &receipt.allocated {
            if let Err(err) = self
                .cache
                .set_active_reservation(
                    reservation.user_id(),
                    sku.as_str(),
                    reservation.id().into_uuid(),
                    self.settings.active_reservation_ttl,
                )
                .await
            {
                warn!(sku = %sku, error = %err, "active-reservation marker write failed");
            }

            let event = ReservationEventMessage::new(
                ReservationEventKind::Created,
                reservation.id().into_uuid(),
                reservation.user_id(),
                sku.as_str(),
                reservation.quantity(),
            );
            if let Err(err) = self.events.publish_event(&event).await {
                warn!(sku = %sku, error = %err, "created event publish failed");
            }
        }
    }

    async fn record_rejection(&self, user_id: Uuid, sku: &str, reason: RejectionReason) {
        if let Err(err) = self
            .cache
            .set_rejection(user_id, sku, &reason.marker(), self.settings.rejection_ttl)
            .await
        {
            warn!(%user_id, sku, error = %err, "rejection marker write failed");
        }
    }

    /// Monitoring safety net. The conditional update is the correctness
    /// mechanism; this only alarms if it was somehow defeated.
    async fn oversell_probe(&self, sku: &Sku, outcome: &mut BatchOutcome) {
        match self.inventory_repo.find_by_sku(sku).await {
            Ok(Some(inventory)) => {
                let delta = inventory.oversell_delta();
                if delta > 0 {
                    outcome.oversell_alarms += 1;
                    error!(
                        sku = %sku,
                        delta,
                        reserved = inventory.reserved_count(),
                        sold = inventory.sold_count(),
                        total = inventory.total_count(),
                        "OVERSELL_DETECTED: reserved + sold exceeds total"
                    );
                }
            }
            Ok(None) => {}
            Err(err) => warn!(sku = %sku, error = %err, "oversell probe read failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cache::InMemoryCoordinationCache;
    use messaging::InMemoryEventBus;
    use uuid::{NoContext, Timestamp};

    use crate::test_support::InMemoryStore;

    type TestAllocator = BatchAllocator<
        InMemoryStore,
        InMemoryStore,
        InMemoryStore,
        InMemoryStore,
        InMemoryCoordinationCache,
        InMemoryEventBus,
    >;

    fn settings() -> AllocatorSettings {
        AllocatorSettings {
            hold: chrono::Duration::seconds(120),
            rejection_ttl: Duration::from_secs(180),
            active_reservation_ttl: Duration::from_secs(150),
        }
    }

    fn build(
        store: &Arc<InMemoryStore>,
        cache: &Arc<InMemoryCoordinationCache>,
        events: &Arc<InMemoryEventBus>,
    ) -> TestAllocator {
        BatchAllocator::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            cache.clone(),
            events.clone(),
            settings(),
        )
    }

    fn new_user() -> Uuid {
        Uuid::new_v7(Timestamp::now(NoContext))
    }

    fn request(user_id: Uuid, sku: &str) -> ReservationRequestMessage {
        ReservationRequestMessage {
            request_id: Uuid::new_v7(Timestamp::now(NoContext)),
            user_id,
            sku_id: sku.to_string(),
            idempotency_key: IdempotencyKey::derive(user_id, sku, None).into_uuid(),
            quantity: 1,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_sku_preserves_arrival_order() {
        let u1 = new_user();
        let u2 = new_user();
        let u3 = new_user();
        let batch = vec![
            request(u1, "SKU-A"),
            request(u2, "SKU-B"),
            request(u3, "SKU-A"),
        ];
        let groups = group_by_sku(&batch);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "SKU-A");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[0].user_id, u1);
        assert_eq!(groups[0].1[1].user_id, u3);
        assert_eq!(groups[1].0, "SKU-B");
    }

    #[tokio::test]
    async fn test_single_winner_among_many() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-A", 1);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());
        let allocator = build(&store, &cache, &events);

        let batch: Vec<_> = (0..50).map(|_| request(new_user(), "SKU-A")).collect();
        let outcome = allocator.process_batch(&batch).await.unwrap();

        assert_eq!(outcome.allocated, 1);
        assert_eq!(outcome.rejected, 49);
        assert_eq!(store.reservation_count(), 1);

        let inventory = store.inventory_snapshot("SKU-A").unwrap();
        assert_eq!(inventory.reserved_count(), 1);
        assert_eq!(inventory.available(), 0);
        assert_eq!(inventory.oversell_delta(), 0);
    }

    #[tokio::test]
    async fn test_partial_batch_fifo_and_two_writes() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-B", 3);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());
        let allocator = build(&store, &cache, &events);

        let users: Vec<Uuid> = (0..10).map(|_| new_user()).collect();
        let batch: Vec<_> = users.iter().map(|u| request(*u, "SKU-B")).collect();
        let outcome = allocator.process_batch(&batch).await.unwrap();

        assert_eq!(outcome.allocated, 3);
        assert_eq!(outcome.rejected, 7);
        // One failed full-group attempt, one successful partial attempt.
        assert_eq!(store.allocation_attempts(), 2);

        // FIFO: exactly the first three arrivals hold reservations.
        for (index, user) in users.iter().enumerate() {
            let key = IdempotencyKey::derive(*user, "SKU-B", None);
            let found = store.find_by_idempotency_key(key).await.unwrap();
            if index < 3 {
                assert!(found.is_some(), "arrival {index} should be allocated");
            } else {
                assert!(found.is_none(), "arrival {index} should be rejected");
            }
        }

        // Losers got rejection markers for the intake to surface.
        let marker = cache.rejection(users[5], "SKU-B").await.unwrap().unwrap();
        assert_eq!(marker.code, "OUT_OF_STOCK");
    }

    #[tokio::test]
    async fn test_duplicate_submits_one_reservation() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-C", 10);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());
        let allocator = build(&store, &cache, &events);

        let user = new_user();
        let batch: Vec<_> = (0..5).map(|_| request(user, "SKU-C")).collect();
        let outcome = allocator.process_batch(&batch).await.unwrap();

        assert_eq!(outcome.allocated, 1);
        assert_eq!(outcome.rejected, 4);
        assert_eq!(store.reservation_count(), 1);
        assert_eq!(store.inventory_snapshot("SKU-C").unwrap().reserved_count(), 1);
    }

    #[tokio::test]
    async fn test_redelivered_batch_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-D", 5);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());
        let allocator = build(&store, &cache, &events);

        let batch: Vec<_> = (0..3).map(|_| request(new_user(), "SKU-D")).collect();
        let first = allocator.process_batch(&batch).await.unwrap();
        assert_eq!(first.allocated, 3);

        let inventory_before = store.inventory_snapshot("SKU-D").unwrap();

        // Redelivery after a lost acknowledgement: zero net state change.
        let second = allocator.process_batch(&batch).await.unwrap();
        assert_eq!(second.allocated, 0);
        assert_eq!(second.rejected, 3);
        assert_eq!(store.reservation_count(), 3);

        let inventory_after = store.inventory_snapshot("SKU-D").unwrap();
        assert_eq!(
            inventory_after.reserved_count(),
            inventory_before.reserved_count()
        );
        assert_eq!(inventory_after.sold_count(), inventory_before.sold_count());
    }

    #[tokio::test]
    async fn test_resubmit_after_expiry_succeeds() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-J", 1);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());
        let allocator = build(&store, &cache, &events);

        let user = new_user();
        let mut first = request(user, "SKU-J");
        first.idempotency_key = IdempotencyKey::derive(user, "SKU-J", Some("n1")).into_uuid();
        let outcome = allocator.process_batch(&[first]).await.unwrap();
        assert_eq!(outcome.allocated, 1);

        // The hold lapses and the sweep releases the unit.
        let held = store
            .reservations_with_status(crate::domain::value_objects::ReservationStatus::Reserved);
        use crate::domain::repositories::ReservationRepository;
        store.expire(held[0].id(), Utc::now()).await.unwrap();

        // Same user, fresh nonce: the unit is theirs again.
        let mut second = request(user, "SKU-J");
        second.idempotency_key = IdempotencyKey::derive(user, "SKU-J", Some("n2")).into_uuid();
        let outcome = allocator.process_batch(&[second]).await.unwrap();
        assert_eq!(outcome.allocated, 1);

        let inventory = store.inventory_snapshot("SKU-J").unwrap();
        assert_eq!(inventory.reserved_count(), 1);
        assert_eq!(inventory.oversell_delta(), 0);
    }

    #[tokio::test]
    async fn test_same_user_two_nonces_second_rejected() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-E", 10);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());
        let allocator = build(&store, &cache, &events);

        let user = new_user();
        let mut first = request(user, "SKU-E");
        first.idempotency_key = IdempotencyKey::derive(user, "SKU-E", Some("n1")).into_uuid();
        let mut second = request(user, "SKU-E");
        second.idempotency_key = IdempotencyKey::derive(user, "SKU-E", Some("n2")).into_uuid();

        let outcome = allocator.process_batch(&[first, second]).await.unwrap();
        assert_eq!(outcome.allocated, 1);
        assert_eq!(outcome.rejected, 1);

        let marker = cache.rejection(user, "SKU-E").await.unwrap().unwrap();
        assert_eq!(marker.code, "USER_HAS_ACTIVE_RESERVATION");
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-F", 10);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());
        let allocator = build(&store, &cache, &events);

        let user = new_user();
        let mut message = request(user, "SKU-F");
        message.quantity = 2;

        let outcome = allocator.process_batch(&[message]).await.unwrap();
        assert_eq!(outcome.allocated, 0);
        assert_eq!(outcome.rejected, 1);
        let marker = cache.rejection(user, "SKU-F").await.unwrap().unwrap();
        assert_eq!(marker.code, "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_cache_outage_validation_falls_back_to_store() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-G", 10);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());
        let allocator = build(&store, &cache, &events);

        cache.set_failing(true);
        let batch: Vec<_> = (0..4).map(|_| request(new_user(), "SKU-G")).collect();
        let outcome = allocator.process_batch(&batch).await.unwrap();

        // Allocation succeeds on the store alone; markers are best-effort.
        assert_eq!(outcome.allocated, 4);
        assert_eq!(outcome.rejected, 0);
        assert_eq!(store.inventory_snapshot("SKU-G").unwrap().reserved_count(), 4);
    }

    #[tokio::test]
    async fn test_created_events_published() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-H", 2);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());
        let allocator = build(&store, &cache, &events);

        let batch: Vec<_> = (0..2).map(|_| request(new_user(), "SKU-H")).collect();
        allocator.process_batch(&batch).await.unwrap();

        let published = events.published();
        assert_eq!(published.len(), 2);
        assert!(published
            .iter()
            .all(|e| e.event == ReservationEventKind::Created && e.sku_id == "SKU-H"));
    }

    #[tokio::test]
    async fn test_store_failure_aborts_batch() {
        let store = Arc::new(InMemoryStore::new());
        store.arm_sale("SKU-I", 5);
        let cache = Arc::new(InMemoryCoordinationCache::new());
        let events = Arc::new(InMemoryEventBus::new());
        let failing = Arc::new(crate::test_support::FailingAllocationStore);

        let allocator = BatchAllocator::new(
            failing,
            store.clone(),
            store.clone(),
            store.clone(),
            cache.clone(),
            events.clone(),
            settings(),
        );

        let batch = vec![request(new_user(), "SKU-I")];
        let result = allocator.process_batch(&batch).await;
        assert!(matches!(
            result,
            Err(ReservationError::TemporarilyUnavailable(_))
        ));
        // Nothing was committed, nothing published.
        assert_eq!(store.reservation_count(), 0);
        assert!(events.published().is_empty());
    }
}
