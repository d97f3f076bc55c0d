// InventoryRepository trait - read access to the per-SKU counter record

use async_trait::async_trait;

use crate::domain::entities::SkuInventory;
use crate::domain::value_objects::Sku;
use crate::ReservationError;

/// Read access to inventory counters. All reserve-side writes go through
/// `AllocationStore`; confirm/cancel/expiry writes ride inside their
/// respective atomic repository operations.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Loads the counter record for a SKU
    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<SkuInventory>, ReservationError>;
}
