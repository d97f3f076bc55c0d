// ProductRepository trait - read access to the sale catalog

use async_trait::async_trait;

use crate::domain::entities::Product;
use crate::domain::value_objects::Sku;
use crate::ReservationError;

/// Read-only catalog access. Products are created by the external admin
/// path and immutable during the sale window.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Finds a product by its SKU
    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<Product>, ReservationError>;
}
