// =============================================================================
// Order Handlers
// =============================================================================
//
// - POST /api/v1/orders/checkout - Confirm a reservation into an order

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};

use reservations::{CheckoutCommand, CheckoutUseCase, OrderResponse};

use crate::error::AppError;
use crate::state::AppState;

/// Handler for POST /api/v1/orders/checkout
///
/// Confirms a reservation: the status flip, the inventory movement, the
/// purchase record and the order commit together.
///
/// # Response
///
/// - 201 Created: order recorded
/// - 404 Not Found: no such reservation
/// - 409 Conflict: reservation not in a confirmable state
/// - 410 Gone: reservation expired before checkout
pub async fn checkout_handler(
    State(state): State<AppState>,
    Json(command): Json<CheckoutCommand>,
) -> Result<(StatusCode, Json<OrderResponse>), Response> {
    let use_case = CheckoutUseCase::new(
        state.checkout_repo(),
        state.cache(),
        state.event_bus(),
        state.config().cache_purchased_ttl,
    );

    let order = use_case
        .execute(command)
        .await
        .map_err(|e| AppError::from(e).into_response())?;

    Ok((StatusCode::CREATED, Json(order)))
}
