// =============================================================================
// Availability Handlers
// =============================================================================
//
// - GET /api/v1/products/{sku}/availability - Advisory stock snapshot

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    response::Response,
    Json,
};

use reservations::{AvailabilityResponse, GetAvailabilityUseCase};

use crate::error::AppError;
use crate::state::AppState;

/// Handler for GET /api/v1/products/{sku}/availability
///
/// Serves the cache-first availability snapshot. Values are advisory and
/// may trail the store by a batch cycle.
///
/// # Response
///
/// - 200 OK: availability snapshot
/// - 404 Not Found: unknown SKU
pub async fn availability_handler(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<AvailabilityResponse>, Response> {
    let config = state.config();
    let use_case = GetAvailabilityUseCase::new(
        state.inventory_repo(),
        state.product_repo(),
        state.cache(),
        config.cache_stock_ttl,
        config.cache_product_ttl,
    );

    let response = use_case
        .execute(&sku)
        .await
        .map_err(|e| AppError::from(e).into_response())?;

    Ok(Json(response))
}
