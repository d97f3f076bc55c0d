// Kafka producers for the request and event topics

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use crate::bus::{EventBus, RequestBus};
use crate::messages::{ReservationEventMessage, ReservationRequestMessage};
use crate::topics;
use crate::MessagingError;

fn build_producer(brokers: &str, publish_timeout: Duration) -> Result<FutureProducer, MessagingError> {
    // message.timeout.ms caps delivery retries; a publish either lands
    // within the window or surfaces an error to the caller.
    let producer = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .set("message.timeout.ms", publish_timeout.as_millis().to_string())
        .set("acks", "all")
        .create()?;
    Ok(producer)
}

async fn send_keyed(
    producer: &FutureProducer,
    timeout: Duration,
    topic: &str,
    key: &str,
    payload: &[u8],
) -> Result<(), MessagingError> {
    let record = FutureRecord::to(topic).key(key).payload(payload);
    producer
        .send(record, Timeout::After(timeout))
        .await
        .map_err(|(err, _message)| MessagingError::Kafka(err))?;
    Ok(())
}

/// Publishes reservation requests keyed by SKU.
pub struct KafkaRequestProducer {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaRequestProducer {
    pub fn new(brokers: &str, publish_timeout: Duration) -> Result<Self, MessagingError> {
        Ok(Self {
            producer: build_producer(brokers, publish_timeout)?,
            timeout: publish_timeout,
        })
    }

    /// Parks a request on the dead-letter topic after repeated batch
    /// failures. The original key is preserved for traceability.
    pub async fn publish_dead_letter(
        &self,
        message: &ReservationRequestMessage,
    ) -> Result<(), MessagingError> {
        let payload = serde_json::to_vec(message)?;
        send_keyed(
            &self.producer,
            self.timeout,
            topics::RESERVATION_REQUESTS_DLQ,
            &message.sku_id,
            &payload,
        )
        .await
    }
}

#[async_trait]
impl RequestBus for KafkaRequestProducer {
    async fn publish_request(
        &self,
        message: &ReservationRequestMessage,
    ) -> Result<(), MessagingError> {
        let payload = serde_json::to_vec(message)?;
        send_keyed(
            &self.producer,
            self.timeout,
            topics::RESERVATION_REQUESTS,
            &message.sku_id,
            &payload,
        )
        .await
    }
}

/// Publishes reservation lifecycle events keyed by SKU.
pub struct KafkaEventProducer {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaEventProducer {
    pub fn new(brokers: &str, publish_timeout: Duration) -> Result<Self, MessagingError> {
        Ok(Self {
            producer: build_producer(brokers, publish_timeout)?,
            timeout: publish_timeout,
        })
    }
}

#[async_trait]
impl EventBus for KafkaEventProducer {
    async fn publish_event(
        &self,
        message: &ReservationEventMessage,
    ) -> Result<(), MessagingError> {
        let payload = serde_json::to_vec(message)?;
        send_keyed(
            &self.producer,
            self.timeout,
            topics::RESERVATION_EVENTS,
            &message.sku_id,
            &payload,
        )
        .await
    }
}
