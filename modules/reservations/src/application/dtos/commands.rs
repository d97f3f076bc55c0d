// Command DTOs for the reservation pipeline
//
// Commands carry primitive types (String, Uuid) rather than domain value
// objects; validation happens inside the use cases.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to submit a reservation request for one unit of a SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReservationCommand {
    /// Authenticated user submitting the request
    pub user_id: Uuid,
    /// SKU to reserve
    pub sku_id: String,
    /// Optional caller-provided nonce folded into the idempotency key.
    /// Without it the sale is one-shot per (user, sku).
    pub request_nonce: Option<String>,
}

/// Command to confirm a reservation at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutCommand {
    pub reservation_id: Uuid,
    pub payment_transaction_id: String,
    pub payment_method: String,
    pub shipping_address: String,
}

/// Command to cancel a held reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelReservationCommand {
    pub reservation_id: Uuid,
}
