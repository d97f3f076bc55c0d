// Value objects for the reservations module

mod idempotency_key;
mod order_id;
mod order_status;
mod reservation_id;
mod reservation_status;
mod sku;

pub use idempotency_key::IdempotencyKey;
pub use order_id::OrderId;
pub use order_status::OrderStatus;
pub use reservation_id::ReservationId;
pub use reservation_status::ReservationStatus;
pub use sku::Sku;
