// GetAvailabilityUseCase - cache-first stock lookups

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use cache::CoordinationCache;

use crate::application::dtos::responses::AvailabilityResponse;
use crate::domain::entities::Product;
use crate::domain::repositories::{InventoryRepository, ProductRepository};
use crate::domain::value_objects::Sku;
use crate::ReservationError;

/// Use case for the availability read path.
///
/// Values are advisory: they may trail the store by a batch cycle, which
/// the intake tolerates by design. Cache faults degrade to store reads.
pub struct GetAvailabilityUseCase<I, P, C>
where
    I: InventoryRepository,
    P: ProductRepository,
    C: CoordinationCache,
{
    inventory_repo: Arc<I>,
    product_repo: Arc<P>,
    cache: Arc<C>,
    stock_ttl: Duration,
    product_ttl: Duration,
}

impl<I, P, C> GetAvailabilityUseCase<I, P, C>
where
    I: InventoryRepository,
    P: ProductRepository,
    C: CoordinationCache,
{
    pub fn new(
        inventory_repo: Arc<I>,
        product_repo: Arc<P>,
        cache: Arc<C>,
        stock_ttl: Duration,
        product_ttl: Duration,
    ) -> Self {
        Self {
            inventory_repo,
            product_repo,
            cache,
            stock_ttl,
            product_ttl,
        }
    }

    pub async fn execute(&self, sku_id: &str) -> Result<AvailabilityResponse, ReservationError> {
        let sku = Sku::new(sku_id)?;

        // Cache hit requires both the count and the product payload.
        if let Ok(Some(available)) = self.cache.stock(sku.as_str()).await {
            if let Ok(Some(payload)) = self.cache.product(sku.as_str()).await {
                if let Ok(product) = serde_json::from_str::<Product>(&payload) {
                    return Ok(AvailabilityResponse {
                        sku_id: sku.as_str().to_string(),
                        available,
                        total: product.total_inventory(),
                        active: product.is_active(),
                    });
                }
            }
        }

        // Miss or outage: the store answers, then repopulates the cache.
        let product = self
            .product_repo
            .find_by_sku(&sku)
            .await?
            .ok_or_else(|| ReservationError::ProductNotFound(sku.as_str().to_string()))?;
        let inventory = self
            .inventory_repo
            .find_by_sku(&sku)
            .await?
            .ok_or_else(|| ReservationError::InventoryNotFound(sku.as_str().to_string()))?;

        if let Err(err) = self
            .cache
            .set_stock(sku.as_str(), inventory.available(), self.stock_ttl)
            .await
        {
            warn!(sku = %sku, error = %err, "stock cache repopulation failed");
        }
        match serde_json::to_string(&product) {
            Ok(payload) => {
                if let Err(err) = self
                    .cache
                    .set_product(sku.as_str(), &payload, self.product_ttl)
                    .await
                {
                    warn!(sku = %sku, error = %err, "product cache repopulation failed");
                }
            }
            Err(err) => warn!(sku = %sku, error = %err, "product serialization failed"),
        }

        Ok(AvailabilityResponse {
            sku_id: sku.as_str().to_string(),
            available: inventory.available(),
            total: inventory.total_count(),
            active: product.is_active(),
        })
    }
}
