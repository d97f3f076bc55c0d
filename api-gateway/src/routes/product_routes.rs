// Product routes
//
// - `GET /{sku}/availability` - Advisory availability snapshot

use axum::{routing::get, Router};

use crate::handlers::availability_handler;
use crate::state::AppState;

pub fn products_router() -> Router<AppState> {
    Router::new().route("/{sku}/availability", get(availability_handler))
}
