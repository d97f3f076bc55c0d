// Entities for the reservations module

mod order;
mod product;
mod reservation;
mod sku_inventory;
mod user_purchase;

pub use order::Order;
pub use product::Product;
pub use reservation::Reservation;
pub use sku_inventory::SkuInventory;
pub use user_purchase::UserPurchase;
