// Repository traits for the reservations module
//
// Each trait method that mutates more than one row is an atomic unit:
// implementations commit it in a single transaction or not at all.

mod allocation_store;
mod checkout_repository;
mod inventory_repository;
mod product_repository;
mod reservation_repository;
mod user_purchase_repository;

pub use allocation_store::{AllocationReceipt, AllocationStore};
pub use checkout_repository::{CheckoutRecord, CheckoutRepository, ConfirmCheckout};
pub use inventory_repository::InventoryRepository;
pub use product_repository::ProductRepository;
pub use reservation_repository::{ExpiryOutcome, ReservationRepository};
pub use user_purchase_repository::UserPurchaseRepository;
