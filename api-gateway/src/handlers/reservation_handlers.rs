// =============================================================================
// Reservation Handlers
// =============================================================================
//
// These handlers implement the REST endpoints for reservations:
// - POST /api/v1/reservations - Submit a reservation request
// - GET /api/v1/reservations/{id} - Fetch a reservation
// - DELETE /api/v1/reservations/{id} - Cancel a reservation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use reservations::{
    CancelReservationCommand, CancelReservationUseCase, GetReservationUseCase,
    ReservationResponse, SubmitOutcome, SubmitReservationCommand, SubmitReservationUseCase,
    SubmitSettings,
};

use crate::error::{rejection_to_error, AppError};
use crate::state::AppState;

/// Body returned for a submit that did not resolve within the deadline.
#[derive(Debug, Clone, Serialize)]
pub struct PendingResponse {
    pub status: &'static str,
    /// Hint for the caller's next poll; retrying with the same payload
    /// deduplicates on the idempotency key.
    pub retry_after_ms: u64,
}

/// Handler for POST /api/v1/reservations
///
/// Submits a reservation request onto the bus and waits up to the intake
/// deadline for an outcome.
///
/// # Response
///
/// - 201 Created: reservation allocated (or already existed for this key)
/// - 202 Accepted: no outcome within the deadline; retry with same payload
/// - 400 Bad Request: validation error
/// - 403 Forbidden: user already purchased this SKU
/// - 409 Conflict: out of stock, duplicate, or active reservation exists
/// - 503 Service Unavailable: bus publish failed
pub async fn submit_reservation_handler(
    State(state): State<AppState>,
    Json(command): Json<SubmitReservationCommand>,
) -> Result<Response, Response> {
    let config = state.config();
    let use_case = SubmitReservationUseCase::new(
        state.reservation_repo(),
        state.cache(),
        state.request_bus(),
        SubmitSettings {
            deadline: config.intake_deadline,
            poll_interval: config.intake_poll_interval,
        },
    );

    let outcome = use_case
        .execute(command)
        .await
        .map_err(|e| AppError::from(e).into_response())?;

    Ok(match outcome {
        SubmitOutcome::Accepted(reservation) => {
            (StatusCode::CREATED, Json(reservation)).into_response()
        }
        SubmitOutcome::Rejected(reason) => rejection_to_error(reason).into_response(),
        SubmitOutcome::Pending => (
            StatusCode::ACCEPTED,
            Json(PendingResponse {
                status: "pending",
                retry_after_ms: state.config().intake_poll_interval.as_millis() as u64 * 4,
            }),
        )
            .into_response(),
    })
}

/// Handler for GET /api/v1/reservations/{id}
///
/// # Response
///
/// - 200 OK: reservation found (order id included once confirmed)
/// - 404 Not Found: no such reservation
pub async fn get_reservation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, Response> {
    let use_case = GetReservationUseCase::new(state.reservation_repo(), state.checkout_repo());

    let response = use_case
        .execute(id)
        .await
        .map_err(|e| AppError::from(e).into_response())?;

    Ok(Json(response))
}

/// Handler for DELETE /api/v1/reservations/{id}
///
/// Cancels a held reservation and releases its unit.
///
/// # Response
///
/// - 200 OK: reservation cancelled
/// - 404 Not Found: no such reservation
/// - 409 Conflict: reservation is confirmed or already cancelled
/// - 410 Gone: reservation already expired
pub async fn cancel_reservation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, Response> {
    let use_case = CancelReservationUseCase::new(
        state.reservation_repo(),
        state.cache(),
        state.event_bus(),
    );

    let response = use_case
        .execute(CancelReservationCommand { reservation_id: id })
        .await
        .map_err(|e| AppError::from(e).into_response())?;

    Ok(Json(response))
}
