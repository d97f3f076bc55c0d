// Reservations module errors
//
// Taxonomy per the engine's error design: input errors surface to the
// caller with a specific reason, transient errors invite a retry, and
// critical conditions are alarms raised in logs while processing
// continues.

use thiserror::Error;
use uuid::Uuid;

use cache::RejectionMarker;

#[derive(Debug, Error)]
pub enum ReservationError {
    // Input errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Duplicate request")]
    DuplicateRequest,

    #[error("User has already purchased this SKU")]
    UserAlreadyPurchased,

    #[error("User already holds an active reservation for this SKU")]
    UserHasActiveReservation,

    #[error("SKU is out of stock")]
    OutOfStock,

    #[error("Reservation has expired")]
    ReservationExpired,

    #[error("Reservation not found: {0}")]
    ReservationNotFound(Uuid),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Inventory not found for SKU '{0}'")]
    InventoryNotFound(String),

    #[error("Invalid reservation state transition")]
    InvalidState,

    #[error("Invalid status value: '{0}'")]
    InvalidStatusValue(String),

    #[error("Invalid SKU: {0}")]
    InvalidSku(String),

    // Transient errors
    #[error("Temporarily unavailable: {0}")]
    TemporarilyUnavailable(String),

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    // Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ReservationError {
    /// The rejection reason to surface to the caller, when this error is
    /// a validation/allocation outcome rather than a fault.
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            ReservationError::InvalidRequest(_) => Some(RejectionReason::InvalidRequest),
            ReservationError::DuplicateRequest => Some(RejectionReason::DuplicateRequest),
            ReservationError::UserAlreadyPurchased => Some(RejectionReason::UserAlreadyPurchased),
            ReservationError::UserHasActiveReservation => {
                Some(RejectionReason::UserHasActiveReservation)
            }
            ReservationError::OutOfStock => Some(RejectionReason::OutOfStock),
            _ => None,
        }
    }
}

/// Reasons a reservation request is rejected by the allocator or the
/// intake pre-checks. Travels through the rejection channel in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    InvalidRequest,
    DuplicateRequest,
    UserAlreadyPurchased,
    UserHasActiveReservation,
    OutOfStock,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::InvalidRequest => "INVALID_REQUEST",
            RejectionReason::DuplicateRequest => "DUPLICATE_REQUEST",
            RejectionReason::UserAlreadyPurchased => "USER_ALREADY_PURCHASED",
            RejectionReason::UserHasActiveReservation => "USER_HAS_ACTIVE_RESERVATION",
            RejectionReason::OutOfStock => "OUT_OF_STOCK",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RejectionReason::InvalidRequest => "Request failed validation",
            RejectionReason::DuplicateRequest => "Request was already submitted",
            RejectionReason::UserAlreadyPurchased => "User has already purchased this SKU",
            RejectionReason::UserHasActiveReservation => {
                "User already holds an active reservation for this SKU"
            }
            RejectionReason::OutOfStock => "No units left for this SKU",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "INVALID_REQUEST" => Some(RejectionReason::InvalidRequest),
            "DUPLICATE_REQUEST" => Some(RejectionReason::DuplicateRequest),
            "USER_ALREADY_PURCHASED" => Some(RejectionReason::UserAlreadyPurchased),
            "USER_HAS_ACTIVE_RESERVATION" => Some(RejectionReason::UserHasActiveReservation),
            "OUT_OF_STOCK" => Some(RejectionReason::OutOfStock),
            _ => None,
        }
    }

    pub fn marker(&self) -> RejectionMarker {
        RejectionMarker::new(self.code(), self.message())
    }

    pub fn from_marker(marker: &RejectionMarker) -> Option<Self> {
        Self::from_code(&marker.code)
    }
}

impl From<RejectionReason> for ReservationError {
    fn from(reason: RejectionReason) -> Self {
        match reason {
            RejectionReason::InvalidRequest => {
                ReservationError::InvalidRequest("rejected by allocator".to_string())
            }
            RejectionReason::DuplicateRequest => ReservationError::DuplicateRequest,
            RejectionReason::UserAlreadyPurchased => ReservationError::UserAlreadyPurchased,
            RejectionReason::UserHasActiveReservation => {
                ReservationError::UserHasActiveReservation
            }
            RejectionReason::OutOfStock => ReservationError::OutOfStock,
        }
    }
}
