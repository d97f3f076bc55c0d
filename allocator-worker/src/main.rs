// Allocator worker - consumes the partitioned bus and drives the batch
// allocator, plus the expiry reconciler loop.
//
// Each worker task owns one consumer in the shared group; Kafka assigns
// every partition to exactly one member, which is what makes the
// allocator the single writer for its SKUs. The reconciler runs beside
// the workers as an independent task.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cache::RedisCoordinationCache;
use common::EngineConfig;
use messaging::{KafkaEventProducer, KafkaRequestProducer, RequestBatchConsumer};
use reservations::{
    AllocatorSettings, BatchAllocator, ExpiryReconciler, PgAllocationStore,
    PgInventoryRepository, PgReservationRepository, PgUserPurchaseRepository,
};

/// Consumer group shared by every allocator worker for the sale.
const CONSUMER_GROUP: &str = "allocator-workers";

type WorkerAllocator = BatchAllocator<
    PgAllocationStore,
    PgInventoryRepository,
    PgReservationRepository,
    PgUserPurchaseRepository,
    RedisCoordinationCache,
    KafkaEventProducer,
>;

type WorkerReconciler =
    ExpiryReconciler<PgReservationRepository, RedisCoordinationCache, KafkaEventProducer>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = EngineConfig::from_env().context("loading configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections((config.allocator_workers * 2 + 2) as u32)
        .connect(&config.database_url)
        .await
        .context("connecting to Postgres")?;
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .context("running migrations")?;

    let cache = Arc::new(
        RedisCoordinationCache::connect(&config.redis_url)
            .await
            .context("connecting to Redis")?,
    );
    let events = Arc::new(
        KafkaEventProducer::new(&config.kafka_brokers, config.publish_timeout)
            .context("creating event producer")?,
    );
    let dead_letter = Arc::new(
        KafkaRequestProducer::new(&config.kafka_brokers, config.publish_timeout)
            .context("creating dead-letter producer")?,
    );

    let reservation_repo = Arc::new(PgReservationRepository::new(pool.clone()));
    let allocator: Arc<WorkerAllocator> = Arc::new(BatchAllocator::new(
        Arc::new(PgAllocationStore::new(pool.clone())),
        Arc::new(PgInventoryRepository::new(pool.clone())),
        reservation_repo.clone(),
        Arc::new(PgUserPurchaseRepository::new(pool.clone())),
        cache.clone(),
        events.clone(),
        AllocatorSettings {
            hold: chrono_duration(config.hold_duration),
            rejection_ttl: config.cache_rejection_ttl,
            active_reservation_ttl: config.active_reservation_ttl(),
        },
    ));

    let mut tasks = Vec::new();
    for worker_id in 0..config.allocator_workers {
        let consumer = RequestBatchConsumer::new(&config.kafka_brokers, CONSUMER_GROUP)
            .with_context(|| format!("creating consumer for worker {worker_id}"))?;
        let allocator = allocator.clone();
        let dead_letter = dead_letter.clone();
        let config = config.clone();
        tasks.push(tokio::spawn(async move {
            run_worker(worker_id, consumer, allocator, dead_letter, config).await;
        }));
    }

    let reconciler: Arc<WorkerReconciler> = Arc::new(ExpiryReconciler::new(
        reservation_repo,
        cache,
        events,
        config.expiry_sweep_batch,
    ));
    let sweep_interval = config.expiry_sweep_interval;
    tasks.push(tokio::spawn(async move {
        reconciler.run(sweep_interval).await;
    }));

    info!(
        workers = config.allocator_workers,
        partitions = config.partition_count,
        "allocator worker running"
    );

    tokio::signal::ctrl_c().await.context("shutdown signal")?;
    info!("shutting down");
    for task in tasks {
        task.abort();
    }

    Ok(())
}

fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::seconds(duration.as_secs() as i64)
}

/// Pull-process-acknowledge loop for one worker.
///
/// A batch whose transaction keeps failing is retried with backoff up to
/// the poison threshold, then parked on the dead-letter topic and
/// acknowledged so the partition keeps moving.
async fn run_worker(
    worker_id: usize,
    consumer: RequestBatchConsumer,
    allocator: Arc<WorkerAllocator>,
    dead_letter: Arc<KafkaRequestProducer>,
    config: EngineConfig,
) {
    loop {
        let batch = match consumer
            .next_batch(config.batch_size, config.batch_max_wait)
            .await
        {
            Ok(batch) => batch,
            Err(err) => {
                warn!(worker_id, error = %err, "batch pull failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };
        if batch.is_empty() {
            continue;
        }

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match allocator.process_batch(&batch.requests).await {
                Ok(outcome) => {
                    info!(
                        worker_id,
                        allocated = outcome.allocated,
                        rejected = outcome.rejected,
                        malformed = batch.malformed,
                        "batch processed"
                    );
                    if let Err(err) = consumer.commit(&batch) {
                        // Redelivery after a lost ack is safe: the
                        // idempotency keys absorb the replay.
                        warn!(worker_id, error = %err, "batch acknowledgement failed");
                    }
                    break;
                }
                Err(err) if attempts >= config.poison_batch_threshold => {
                    error!(
                        worker_id,
                        attempts,
                        error = %err,
                        "POISON_BATCH: parking batch on dead-letter topic"
                    );
                    for request in &batch.requests {
                        if let Err(err) = dead_letter.publish_dead_letter(request).await {
                            warn!(worker_id, error = %err, "dead-letter publish failed");
                        }
                    }
                    if let Err(err) = consumer.commit(&batch) {
                        warn!(worker_id, error = %err, "poison batch acknowledgement failed");
                    }
                    break;
                }
                Err(err) => {
                    warn!(
                        worker_id,
                        attempts,
                        error = %err,
                        "batch commit failed; retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempts))).await;
                }
            }
        }
    }
}
