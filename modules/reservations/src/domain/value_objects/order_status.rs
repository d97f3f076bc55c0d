// OrderStatus enum - status of an order created at checkout

use crate::ReservationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of an order. Fulfillment transitions are driven by an external
/// workflow; the reservation core only creates orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PaymentPending,
    Confirmed,
    Fulfilled,
    Cancelled,
    PaymentFailed,
}

impl FromStr for OrderStatus {
    type Err = ReservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "payment_pending" => Ok(OrderStatus::PaymentPending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            "payment_failed" => Ok(OrderStatus::PaymentFailed),
            other => Err(ReservationError::InvalidStatusValue(other.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::PaymentPending => write!(f, "payment_pending"),
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::Fulfilled => write!(f, "fulfilled"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::PaymentFailed => write!(f, "payment_failed"),
        }
    }
}
