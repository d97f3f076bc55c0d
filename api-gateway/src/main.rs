// API Gateway - HTTP surface of the flash-sale reservation engine

mod error;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use common::{health_check_simple, EngineConfig};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::RedisCoordinationCache;
use messaging::{KafkaEventProducer, KafkaRequestProducer};
use reservations::{
    PgCheckoutRepository, PgInventoryRepository, PgProductRepository, PgReservationRepository,
};

use crate::routes::{orders_router, products_router, reservations_router};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = EngineConfig::from_env().context("loading configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .context("connecting to Postgres")?;
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .context("running migrations")?;

    let cache = RedisCoordinationCache::connect(&config.redis_url)
        .await
        .context("connecting to Redis")?;
    let request_bus = KafkaRequestProducer::new(&config.kafka_brokers, config.publish_timeout)
        .context("creating request producer")?;
    let event_bus = KafkaEventProducer::new(&config.kafka_brokers, config.publish_timeout)
        .context("creating event producer")?;

    let state = AppState::new(
        Arc::new(PgReservationRepository::new(pool.clone())),
        Arc::new(PgCheckoutRepository::new(pool.clone())),
        Arc::new(PgInventoryRepository::new(pool.clone())),
        Arc::new(PgProductRepository::new(pool.clone())),
        Arc::new(cache),
        Arc::new(request_bus),
        Arc::new(event_bus),
        config.clone(),
    );

    let app = Router::new()
        .route("/health", get(health_check_simple))
        .nest("/api/v1/reservations", reservations_router())
        .nest("/api/v1/orders", orders_router())
        .nest("/api/v1/products", products_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "API gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to install shutdown handler");
    }
}
