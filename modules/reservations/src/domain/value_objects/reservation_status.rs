// ReservationStatus enum - state machine over a user's hold on one unit

use crate::ReservationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a reservation.
///
/// Transitions: Reserved -> Confirmed (checkout), Reserved -> Expired
/// (reconciler), Reserved -> Cancelled (user). Confirmed, Expired and
/// Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Holding one unit until expiry or checkout
    Reserved,
    /// Checkout consumed the hold; unit is sold
    Confirmed,
    /// Hold lapsed; unit released back to inventory
    Expired,
    /// User released the hold before expiry
    Cancelled,
}

impl ReservationStatus {
    /// Returns true while the reservation is holding a unit
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Reserved)
    }

    /// Returns true once no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Confirmed | ReservationStatus::Expired | ReservationStatus::Cancelled
        )
    }
}

impl FromStr for ReservationStatus {
    type Err = ReservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reserved" => Ok(ReservationStatus::Reserved),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "expired" => Ok(ReservationStatus::Expired),
            "cancelled" | "canceled" => Ok(ReservationStatus::Cancelled),
            other => Err(ReservationError::InvalidStatusValue(other.to_string())),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Reserved => write!(f, "reserved"),
            ReservationStatus::Confirmed => write!(f, "confirmed"),
            ReservationStatus::Expired => write!(f, "expired"),
            ReservationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
