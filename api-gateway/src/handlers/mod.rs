// HTTP handlers for the API Gateway

pub mod availability_handlers;
pub mod order_handlers;
pub mod reservation_handlers;

pub use availability_handlers::availability_handler;
pub use order_handlers::checkout_handler;
pub use reservation_handlers::{
    cancel_reservation_handler, get_reservation_handler, submit_reservation_handler,
};
