// CheckoutRepository trait - the confirm path's atomic transaction

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{Order, Reservation};
use crate::domain::value_objects::ReservationId;
use crate::ReservationError;

/// Input to the confirm transaction.
#[derive(Debug, Clone)]
pub struct ConfirmCheckout {
    pub reservation_id: ReservationId,
    pub payment_transaction_id: String,
    pub payment_method: String,
    pub shipping_address: String,
    pub now: DateTime<Utc>,
}

/// What the confirm transaction produced.
#[derive(Debug, Clone)]
pub struct CheckoutRecord {
    pub reservation: Reservation,
    pub order: Order,
}

/// Confirms reservations and records orders.
///
/// `confirm` is one transaction: row-locked status check, reservation
/// flip, inventory reserved -> sold, user-purchase insert, order insert.
/// A unique violation on the purchase record collapses to
/// `UserAlreadyPurchased`; racing the expiry reconciler is serialized on
/// the reservation row, so exactly one side prevails.
#[async_trait]
pub trait CheckoutRepository: Send + Sync {
    async fn confirm(&self, checkout: &ConfirmCheckout)
        -> Result<CheckoutRecord, ReservationError>;

    /// Finds the order created for a reservation, if confirmed
    async fn find_order_by_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Order>, ReservationError>;
}
