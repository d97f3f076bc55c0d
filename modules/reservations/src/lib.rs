// Reservations module - the flash-sale reservation pipeline
//
// Write side: intake -> partitioned bus -> batch allocator -> store.
// Read side: cache-first availability lookups. The store is the source of
// truth; the coordination cache is a derived, discardable view.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{RejectionReason, ReservationError};

pub use domain::entities::{Order, Product, Reservation, SkuInventory, UserPurchase};
pub use domain::repositories::{
    AllocationReceipt, AllocationStore, CheckoutRepository, ConfirmCheckout, CheckoutRecord,
    ExpiryOutcome, InventoryRepository, ProductRepository, ReservationRepository,
    UserPurchaseRepository,
};
pub use domain::value_objects::{
    IdempotencyKey, OrderId, OrderStatus, ReservationId, ReservationStatus, Sku,
};

pub use application::allocator::{AllocatorSettings, BatchAllocator, BatchOutcome};
pub use application::dtos::commands::{
    CancelReservationCommand, CheckoutCommand, SubmitReservationCommand,
};
pub use application::dtos::responses::{
    AvailabilityResponse, OrderResponse, ReservationResponse, SubmitOutcome,
};
pub use application::expiry::{ExpiryReconciler, SweepReport};
pub use application::use_cases::{
    CancelReservationUseCase, CheckoutUseCase, GetAvailabilityUseCase, GetReservationUseCase,
    SubmitReservationUseCase, SubmitSettings,
};

pub use infrastructure::persistence::{
    PgAllocationStore, PgCheckoutRepository, PgInventoryRepository, PgProductRepository,
    PgReservationRepository, PgUserPurchaseRepository,
};
