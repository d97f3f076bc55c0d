// Application state for sharing dependencies across handlers

use std::sync::Arc;

use common::EngineConfig;

use cache::RedisCoordinationCache;
use messaging::{KafkaEventProducer, KafkaRequestProducer};
use reservations::{
    PgCheckoutRepository, PgInventoryRepository, PgProductRepository, PgReservationRepository,
};

/// Application state shared across all HTTP handlers.
///
/// Holds Arc-wrapped repositories, the coordination cache, the bus
/// producers and the engine configuration. Handlers build the use cases
/// they need per request; construction is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Reservation repository for lookups and lifecycle writes
    reservation_repo: Arc<PgReservationRepository>,
    /// Checkout repository for the confirm transaction
    checkout_repo: Arc<PgCheckoutRepository>,
    /// Inventory repository for availability reads
    inventory_repo: Arc<PgInventoryRepository>,
    /// Product repository for the sale catalog
    product_repo: Arc<PgProductRepository>,
    /// Coordination cache (stock counts, markers, rejection channel)
    cache: Arc<RedisCoordinationCache>,
    /// Producer for the reservation-requests topic
    request_bus: Arc<KafkaRequestProducer>,
    /// Producer for the reservation-events topic
    event_bus: Arc<KafkaEventProducer>,
    /// Engine configuration
    config: EngineConfig,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reservation_repo: Arc<PgReservationRepository>,
        checkout_repo: Arc<PgCheckoutRepository>,
        inventory_repo: Arc<PgInventoryRepository>,
        product_repo: Arc<PgProductRepository>,
        cache: Arc<RedisCoordinationCache>,
        request_bus: Arc<KafkaRequestProducer>,
        event_bus: Arc<KafkaEventProducer>,
        config: EngineConfig,
    ) -> Self {
        Self {
            reservation_repo,
            checkout_repo,
            inventory_repo,
            product_repo,
            cache,
            request_bus,
            event_bus,
            config,
        }
    }

    pub fn reservation_repo(&self) -> Arc<PgReservationRepository> {
        self.reservation_repo.clone()
    }

    pub fn checkout_repo(&self) -> Arc<PgCheckoutRepository> {
        self.checkout_repo.clone()
    }

    pub fn inventory_repo(&self) -> Arc<PgInventoryRepository> {
        self.inventory_repo.clone()
    }

    pub fn product_repo(&self) -> Arc<PgProductRepository> {
        self.product_repo.clone()
    }

    pub fn cache(&self) -> Arc<RedisCoordinationCache> {
        self.cache.clone()
    }

    pub fn request_bus(&self) -> Arc<KafkaRequestProducer> {
        self.request_bus.clone()
    }

    pub fn event_bus(&self) -> Arc<KafkaEventProducer> {
        self.event_bus.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
