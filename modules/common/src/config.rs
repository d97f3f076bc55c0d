// Engine configuration loaded from the environment
//
// Both binaries (api-gateway, allocator-worker) load a single EngineConfig
// at startup. Tunables default to the values the sale is expected to run
// with; connection strings are required.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidVar(&'static str, String),
}

/// Runtime configuration for the flash-sale engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Postgres connection string
    pub database_url: String,
    /// Redis connection string
    pub redis_url: String,
    /// Comma-separated Kafka/Redpanda bootstrap servers
    pub kafka_brokers: String,
    /// How long a reservation holds a unit before auto-expiry
    pub hold_duration: Duration,
    /// Maximum messages per allocator batch
    pub batch_size: usize,
    /// Maximum time to wait filling a batch once the first message arrived
    pub batch_max_wait: Duration,
    /// Delay between expiry reconciler runs
    pub expiry_sweep_interval: Duration,
    /// Maximum reservations expired per reconciler run
    pub expiry_sweep_batch: i64,
    /// Bus partition count; fixed for the duration of a sale
    pub partition_count: u32,
    /// Number of allocator workers (each holds its own consumer)
    pub allocator_workers: usize,
    /// Client-visible deadline for a submit request
    pub intake_deadline: Duration,
    /// Interval between intake polls of the rejection channel / store
    pub intake_poll_interval: Duration,
    /// Total cap on a single bus publish, retries included
    pub publish_timeout: Duration,
    /// TTL for cached stock counts
    pub cache_stock_ttl: Duration,
    /// TTL for cached product payloads
    pub cache_product_ttl: Duration,
    /// TTL for rejection markers
    pub cache_rejection_ttl: Duration,
    /// TTL for user-purchased markers
    pub cache_purchased_ttl: Duration,
    /// Extra TTL on active-reservation markers beyond the hold duration
    pub active_reservation_ttl_margin: Duration,
    /// Consecutive commit failures before a batch is parked on the DLQ
    pub poison_batch_threshold: u32,
    /// HTTP bind address for the gateway
    pub bind_addr: String,
}

impl EngineConfig {
    /// Loads the configuration from environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingVar` when a connection string is absent
    /// and `ConfigError::InvalidVar` when a numeric tunable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            kafka_brokers: required("KAFKA_BROKERS")?,
            hold_duration: Duration::from_secs(env_u64("HOLD_DURATION_SECS", 120)?),
            batch_size: env_u64("BATCH_SIZE", 250)? as usize,
            batch_max_wait: Duration::from_millis(env_u64("BATCH_MAX_WAIT_MS", 10)?),
            expiry_sweep_interval: Duration::from_secs(env_u64("EXPIRY_SWEEP_INTERVAL_SECS", 10)?),
            expiry_sweep_batch: env_u64("EXPIRY_SWEEP_BATCH", 100)? as i64,
            partition_count: env_u64("PARTITION_COUNT", 16)? as u32,
            allocator_workers: env_u64("ALLOCATOR_WORKERS", 4)? as usize,
            intake_deadline: Duration::from_millis(env_u64("INTAKE_DEADLINE_MS", 2000)?),
            intake_poll_interval: Duration::from_millis(env_u64("INTAKE_POLL_INTERVAL_MS", 50)?),
            publish_timeout: Duration::from_millis(env_u64("PUBLISH_TIMEOUT_MS", 500)?),
            cache_stock_ttl: Duration::from_secs(env_u64("CACHE_STOCK_TTL_SECS", 300)?),
            cache_product_ttl: Duration::from_secs(env_u64("CACHE_PRODUCT_TTL_SECS", 600)?),
            cache_rejection_ttl: Duration::from_secs(env_u64("CACHE_REJECTION_TTL_SECS", 180)?),
            cache_purchased_ttl: Duration::from_secs(env_u64("CACHE_PURCHASED_TTL_SECS", 86_400)?),
            active_reservation_ttl_margin: Duration::from_secs(env_u64(
                "ACTIVE_RESERVATION_TTL_MARGIN_SECS",
                30,
            )?),
            poison_batch_threshold: env_u64("POISON_BATCH_THRESHOLD", 5)? as u32,
            bind_addr: optional("BIND_ADDR", "0.0.0.0:3000"),
        })
    }

    /// TTL applied to active-reservation markers: hold duration plus margin.
    pub fn active_reservation_ttl(&self) -> Duration {
        self.hold_duration + self.active_reservation_ttl_margin
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn optional(name: &'static str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidVar(name, raw)),
        Err(_) => Ok(default),
    }
}
