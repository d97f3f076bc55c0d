// SkuInventory entity - canonical per-SKU counter record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Sku;
use crate::ReservationError;

/// Inventory counters for one SKU.
///
/// Invariants:
/// - reserved_count + sold_count <= total_count at every commit boundary
/// - total_count never changes once the sale is armed
///
/// available_count is derived and recomputed on every mutation; it is
/// stored so the allocator's conditional update can predicate on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkuInventory {
    sku: Sku,
    total_count: i64,
    reserved_count: i64,
    sold_count: i64,
    available_count: i64,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl SkuInventory {
    /// Creates the counter record when a sale is armed.
    pub fn new(sku: Sku, total_count: i64) -> Self {
        Self {
            sku,
            total_count,
            reserved_count: 0,
            sold_count: 0,
            available_count: total_count,
            version: 1,
            updated_at: Utc::now(),
        }
    }

    /// Reconstitutes a SkuInventory from persistence.
    ///
    /// Does not reject an oversold row: the engine must be able to
    /// observe and alarm on one, not refuse to load it.
    pub fn reconstitute(
        sku: Sku,
        total_count: i64,
        reserved_count: i64,
        sold_count: i64,
        version: i64,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sku,
            total_count,
            reserved_count,
            sold_count,
            available_count: total_count - reserved_count - sold_count,
            version,
            updated_at,
        }
    }

    /// Units currently free to reserve
    pub fn available(&self) -> i64 {
        self.total_count - self.reserved_count - self.sold_count
    }

    /// Units held beyond the cap; positive means a critical oversell
    pub fn oversell_delta(&self) -> i64 {
        (self.reserved_count + self.sold_count - self.total_count).max(0)
    }

    /// Reserves `units`, guarded by availability.
    pub fn reserve(&mut self, units: i64) -> Result<(), ReservationError> {
        if units <= 0 {
            return Err(ReservationError::InvalidRequest(format!(
                "cannot reserve {units} units"
            )));
        }
        if units > self.available() {
            return Err(ReservationError::OutOfStock);
        }
        self.reserved_count += units;
        self.touch();
        Ok(())
    }

    /// Releases `units` back to the pool (cancel / expiry).
    pub fn release(&mut self, units: i64) -> Result<(), ReservationError> {
        if units <= 0 || units > self.reserved_count {
            return Err(ReservationError::InvalidRequest(format!(
                "cannot release {units} of {} reserved units",
                self.reserved_count
            )));
        }
        self.reserved_count -= units;
        self.touch();
        Ok(())
    }

    /// Converts one reserved unit into a sold unit (checkout).
    pub fn commit_sale(&mut self) -> Result<(), ReservationError> {
        if self.reserved_count < 1 {
            return Err(ReservationError::InvalidState);
        }
        self.reserved_count -= 1;
        self.sold_count += 1;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.available_count = self.available();
        self.version += 1;
        self.updated_at = Utc::now();
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn total_count(&self) -> i64 {
        self.total_count
    }

    pub fn reserved_count(&self) -> i64 {
        self.reserved_count
    }

    pub fn sold_count(&self) -> i64 {
        self.sold_count
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(total: i64) -> SkuInventory {
        SkuInventory::new(Sku::from_string("SALE-TV-55".to_string()), total)
    }

    #[test]
    fn test_new_inventory() {
        let inv = inventory(100);
        assert_eq!(inv.total_count(), 100);
        assert_eq!(inv.reserved_count(), 0);
        assert_eq!(inv.sold_count(), 0);
        assert_eq!(inv.available(), 100);
        assert_eq!(inv.version(), 1);
    }

    #[test]
    fn test_reserve_and_release() {
        let mut inv = inventory(10);
        inv.reserve(3).unwrap();
        assert_eq!(inv.reserved_count(), 3);
        assert_eq!(inv.available(), 7);

        inv.release(2).unwrap();
        assert_eq!(inv.reserved_count(), 1);
        assert_eq!(inv.available(), 9);
    }

    #[test]
    fn test_reserve_beyond_available() {
        let mut inv = inventory(2);
        inv.reserve(2).unwrap();
        assert!(matches!(inv.reserve(1), Err(ReservationError::OutOfStock)));
    }

    #[test]
    fn test_release_more_than_reserved() {
        let mut inv = inventory(5);
        inv.reserve(1).unwrap();
        assert!(inv.release(2).is_err());
    }

    #[test]
    fn test_commit_sale() {
        let mut inv = inventory(5);
        inv.reserve(2).unwrap();
        inv.commit_sale().unwrap();
        assert_eq!(inv.reserved_count(), 1);
        assert_eq!(inv.sold_count(), 1);
        // Available unchanged: the unit moved reserved -> sold.
        assert_eq!(inv.available(), 3);
    }

    #[test]
    fn test_commit_sale_without_reservation() {
        let mut inv = inventory(5);
        assert!(matches!(
            inv.commit_sale(),
            Err(ReservationError::InvalidState)
        ));
    }

    #[test]
    fn test_oversell_delta_observed_on_reconstitute() {
        let inv = SkuInventory::reconstitute(
            Sku::from_string("SALE-TV-55".to_string()),
            10,
            8,
            4,
            7,
            Utc::now(),
        );
        assert_eq!(inv.oversell_delta(), 2);
    }

    #[test]
    fn test_version_increments_on_mutation() {
        let mut inv = inventory(5);
        let v0 = inv.version();
        inv.reserve(1).unwrap();
        assert_eq!(inv.version(), v0 + 1);
        inv.commit_sale().unwrap();
        assert_eq!(inv.version(), v0 + 2);
    }
}
