// UserPurchase entity - enforcement record for the one-per-user rule

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{OrderId, ReservationId, Sku};

/// Records that a user bought one unit of a SKU. Backed by a unique
/// constraint on (user_id, sku_id); never deleted while the sale runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPurchase {
    user_id: Uuid,
    sku: Sku,
    order_id: OrderId,
    reservation_id: ReservationId,
    purchased_at: DateTime<Utc>,
}

impl UserPurchase {
    pub fn new(
        user_id: Uuid,
        sku: Sku,
        order_id: OrderId,
        reservation_id: ReservationId,
        purchased_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            sku,
            order_id,
            reservation_id,
            purchased_at,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn reservation_id(&self) -> ReservationId {
        self.reservation_id
    }

    pub fn purchased_at(&self) -> DateTime<Utc> {
        self.purchased_at
    }
}
