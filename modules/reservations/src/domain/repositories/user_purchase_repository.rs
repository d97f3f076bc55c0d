// UserPurchaseRepository trait - one-per-user enforcement lookups

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::UserPurchase;
use crate::domain::value_objects::Sku;
use crate::ReservationError;

/// Read access to purchase records. Inserts happen inside the checkout
/// transaction; this trait only answers "has this user already bought".
#[async_trait]
pub trait UserPurchaseRepository: Send + Sync {
    /// Returns true when the user has a recorded purchase for the SKU
    async fn exists(&self, user_id: Uuid, sku: &Sku) -> Result<bool, ReservationError>;

    /// Loads the purchase record, if present
    async fn find(
        &self,
        user_id: Uuid,
        sku: &Sku,
    ) -> Result<Option<UserPurchase>, ReservationError>;
}
