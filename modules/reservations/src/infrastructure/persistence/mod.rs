// PostgreSQL repository implementations

mod pg_allocation_store;
mod pg_checkout_repository;
mod pg_inventory_repository;
mod pg_product_repository;
mod pg_reservation_repository;
mod pg_user_purchase_repository;

// Re-exports
pub use pg_allocation_store::PgAllocationStore;
pub use pg_checkout_repository::PgCheckoutRepository;
pub use pg_inventory_repository::PgInventoryRepository;
pub use pg_product_repository::PgProductRepository;
pub use pg_reservation_repository::PgReservationRepository;
pub use pg_user_purchase_repository::PgUserPurchaseRepository;

/// True for a Postgres unique-constraint violation (SQLSTATE 23505).
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
