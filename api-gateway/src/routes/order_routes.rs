// Order routes
//
// - `POST /checkout` - Confirm a reservation into an order

use axum::{routing::post, Router};

use crate::handlers::checkout_handler;
use crate::state::AppState;

pub fn orders_router() -> Router<AppState> {
    Router::new().route("/checkout", post(checkout_handler))
}
