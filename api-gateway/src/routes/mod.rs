// HTTP routes for the API Gateway

pub mod order_routes;
pub mod product_routes;
pub mod reservation_routes;

pub use order_routes::orders_router;
pub use product_routes::products_router;
pub use reservation_routes::reservations_router;
