// AllocationStore trait - the allocator's single write seam

use async_trait::async_trait;

use crate::domain::entities::Reservation;
use crate::domain::value_objects::Sku;
use crate::ReservationError;

/// Result of one conditional allocation attempt.
#[derive(Debug, Clone)]
pub struct AllocationReceipt {
    /// Drafts whose reservation rows were inserted
    pub allocated: Vec<Reservation>,
    /// Drafts skipped because their idempotency key already existed
    pub duplicates: Vec<Reservation>,
}

/// Atomic reserve-side write: increments the inventory counters and
/// inserts reservation rows in one transaction.
///
/// The conditional `available_count >= K` guard is the only oversell
/// defense that matters; everything else is monitoring. Implementations
/// return `Ok(None)` when the guard fails so the allocator can run its
/// partial second phase, and must leave the store untouched in that case.
///
/// A draft whose idempotency key already exists is skipped, reported in
/// `duplicates`, and its unit is handed back within the same transaction,
/// so a receipt never holds units without matching rows.
#[async_trait]
pub trait AllocationStore: Send + Sync {
    /// Attempts to reserve `drafts.len()` units of `sku` and insert the
    /// draft reservations. Returns `None` if the availability guard
    /// rejected the batch.
    async fn try_allocate(
        &self,
        sku: &Sku,
        drafts: &[Reservation],
    ) -> Result<Option<AllocationReceipt>, ReservationError>;
}
