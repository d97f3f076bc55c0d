// Cache key builders
//
// Key layout (one writer column per key family):
//   stock:{sku}                      integer stock count
//   product:{sku}                    serialized product
//   user_purchased:{user}:{sku}      sentinel
//   active_reservation:{user}:{sku}  reservation id
//   rejection:{user}:{sku}           "CODE:message"

use uuid::Uuid;

pub fn stock_key(sku: &str) -> String {
    format!("stock:{sku}")
}

pub fn product_key(sku: &str) -> String {
    format!("product:{sku}")
}

pub fn user_purchased_key(user_id: Uuid, sku: &str) -> String {
    format!("user_purchased:{user_id}:{sku}")
}

pub fn active_reservation_key(user_id: Uuid, sku: &str) -> String {
    format!("active_reservation:{user_id}:{sku}")
}

pub fn rejection_key(user_id: Uuid, sku: &str) -> String {
    format!("rejection:{user_id}:{sku}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        let user = Uuid::nil();
        assert_eq!(stock_key("SKU-1"), "stock:SKU-1");
        assert_eq!(
            rejection_key(user, "SKU-1"),
            format!("rejection:{user}:SKU-1")
        );
        assert_eq!(
            active_reservation_key(user, "SKU-1"),
            format!("active_reservation:{user}:SKU-1")
        );
    }
}
