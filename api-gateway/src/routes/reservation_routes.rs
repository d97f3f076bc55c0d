// Reservation routes
//
// - `POST /` - Submit a reservation request
// - `GET /{id}` - Fetch a reservation
// - `DELETE /{id}` - Cancel a reservation

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{
    cancel_reservation_handler, get_reservation_handler, submit_reservation_handler,
};
use crate::state::AppState;

pub fn reservations_router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_reservation_handler))
        .route(
            "/{id}",
            get(get_reservation_handler).delete(cancel_reservation_handler),
        )
}
