// API Gateway Error Handling
//
// Maps domain errors to HTTP responses with a JSON error envelope.
//
// | Domain error | HTTP status | Error code |
// |--------------|-------------|------------|
// | InvalidRequest / InvalidSku | 400 | VALIDATION_ERROR |
// | DuplicateRequest | 409 | DUPLICATE_REQUEST |
// | UserAlreadyPurchased | 403 | USER_ALREADY_PURCHASED |
// | UserHasActiveReservation | 409 | USER_HAS_ACTIVE_RESERVATION |
// | OutOfStock | 409 | OUT_OF_STOCK |
// | ReservationExpired | 410 | RESERVATION_EXPIRED |
// | *NotFound | 404 | NOT_FOUND |
// | InvalidState | 409 | INVALID_STATE |
// | TemporarilyUnavailable | 503 | TEMPORARILY_UNAVAILABLE |
// | Database / other | 500 | INTERNAL_ERROR |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use reservations::{RejectionReason, ReservationError};

/// JSON error envelope returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// Unified error type for the API Gateway.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    response: ErrorResponse,
}

impl AppError {
    pub fn new(status: StatusCode, response: ErrorResponse) -> Self {
        Self { status, response }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        let (status, response) = match &err {
            // 400 Bad Request - validation failures
            ReservationError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", msg.clone()),
            ),
            ReservationError::InvalidSku(sku) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", format!("Invalid SKU: {sku}")),
            ),
            ReservationError::InvalidStatusValue(value) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", format!("Invalid status: {value}")),
            ),

            // 403 Forbidden
            ReservationError::UserAlreadyPurchased => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("USER_ALREADY_PURCHASED", err.to_string()),
            ),

            // 409 Conflict
            ReservationError::DuplicateRequest => (
                StatusCode::CONFLICT,
                ErrorResponse::new("DUPLICATE_REQUEST", err.to_string()),
            ),
            ReservationError::UserHasActiveReservation => (
                StatusCode::CONFLICT,
                ErrorResponse::new("USER_HAS_ACTIVE_RESERVATION", err.to_string()),
            ),
            ReservationError::OutOfStock => (
                StatusCode::CONFLICT,
                ErrorResponse::new("OUT_OF_STOCK", err.to_string()),
            ),
            ReservationError::InvalidState => (
                StatusCode::CONFLICT,
                ErrorResponse::new("INVALID_STATE", err.to_string()),
            ),

            // 410 Gone
            ReservationError::ReservationExpired => (
                StatusCode::GONE,
                ErrorResponse::new("RESERVATION_EXPIRED", err.to_string()),
            ),

            // 404 Not Found
            ReservationError::ReservationNotFound(_)
            | ReservationError::OrderNotFound(_)
            | ReservationError::ProductNotFound(_)
            | ReservationError::InventoryNotFound(_) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", err.to_string()),
            ),

            // 503 Service Unavailable - transient
            ReservationError::TemporarilyUnavailable(_) | ReservationError::DeadlineExceeded => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new("TEMPORARILY_UNAVAILABLE", err.to_string()),
            ),

            // 500 Internal Server Error
            ReservationError::Database(_) => {
                tracing::error!(error = %err, "store failure surfaced to handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "Internal server error"),
                )
            }
        };
        AppError::new(status, response)
    }
}

/// Maps an allocator rejection surfaced at intake to its HTTP response.
pub fn rejection_to_error(reason: RejectionReason) -> AppError {
    let status = match reason {
        RejectionReason::InvalidRequest => StatusCode::BAD_REQUEST,
        RejectionReason::UserAlreadyPurchased => StatusCode::FORBIDDEN,
        RejectionReason::DuplicateRequest
        | RejectionReason::UserHasActiveReservation
        | RejectionReason::OutOfStock => StatusCode::CONFLICT,
    };
    AppError::new(status, ErrorResponse::new(reason.code(), reason.message()))
}
