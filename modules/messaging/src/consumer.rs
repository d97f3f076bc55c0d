// Batch consumer for the reservation-requests topic
//
// One consumer per allocator worker. The consumer group assigns each
// partition to exactly one member, so every SKU has a single writer for
// as long as the assignment holds. Offsets are committed manually, only
// after the allocator has committed the batch to the store.

use std::collections::HashMap;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};
use tokio::time::Instant;
use tracing::warn;

use crate::messages::ReservationRequestMessage;
use crate::topics;
use crate::MessagingError;

/// One pulled batch: parsed requests plus the offsets to acknowledge.
#[derive(Debug)]
pub struct RequestBatch {
    /// Requests in delivery order (FIFO within each partition).
    pub requests: Vec<ReservationRequestMessage>,
    /// Payloads that failed to parse and were discarded.
    pub malformed: usize,
    /// Highest consumed offset per (topic, partition).
    offsets: HashMap<(String, i32), i64>,
}

impl RequestBatch {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.malformed == 0
    }
}

/// Pull-based consumer that assembles bounded batches.
pub struct RequestBatchConsumer {
    consumer: StreamConsumer,
}

impl RequestBatchConsumer {
    /// Creates a consumer joined to `group_id` and subscribed to the
    /// reservation-requests topic.
    pub fn new(brokers: &str, group_id: &str) -> Result<Self, MessagingError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("enable.partition.eof", "false")
            .create()?;
        consumer.subscribe(&[topics::RESERVATION_REQUESTS])?;
        Ok(Self { consumer })
    }

    /// Pulls up to `max_size` messages, waiting at most `max_wait` after
    /// the first message arrives. Blocks until at least one message is
    /// delivered.
    pub async fn next_batch(
        &self,
        max_size: usize,
        max_wait: Duration,
    ) -> Result<RequestBatch, MessagingError> {
        let mut batch = RequestBatch {
            requests: Vec::new(),
            malformed: 0,
            offsets: HashMap::new(),
        };

        let first = self.consumer.recv().await?;
        Self::ingest(&mut batch, &first);

        let deadline = Instant::now() + max_wait;
        while batch.requests.len() + batch.malformed < max_size {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, self.consumer.recv()).await {
                Ok(Ok(message)) => Self::ingest(&mut batch, &message),
                Ok(Err(err)) => {
                    // Deliver what we have; the error resurfaces on the
                    // next pull if the broker is really gone.
                    warn!(error = %err, "recv failed mid-batch");
                    break;
                }
                Err(_elapsed) => break,
            }
        }

        Ok(batch)
    }

    /// Acknowledges every offset in the batch. Called only after the
    /// allocator committed its transactions.
    pub fn commit(&self, batch: &RequestBatch) -> Result<(), MessagingError> {
        if batch.offsets.is_empty() {
            return Ok(());
        }
        let mut tpl = TopicPartitionList::new();
        for ((topic, partition), offset) in &batch.offsets {
            tpl.add_partition_offset(topic, *partition, Offset::Offset(offset + 1))?;
        }
        self.consumer.commit(&tpl, CommitMode::Sync)?;
        Ok(())
    }

    fn ingest(batch: &mut RequestBatch, message: &rdkafka::message::BorrowedMessage<'_>) {
        let key = (message.topic().to_string(), message.partition());
        let offset = message.offset();
        batch
            .offsets
            .entry(key)
            .and_modify(|existing| *existing = (*existing).max(offset))
            .or_insert(offset);

        let Some(payload) = message.payload() else {
            batch.malformed += 1;
            warn!(partition = message.partition(), offset, "empty request payload discarded");
            return;
        };
        match serde_json::from_slice::<ReservationRequestMessage>(payload) {
            Ok(request) => batch.requests.push(request),
            Err(err) => {
                batch.malformed += 1;
                warn!(
                    partition = message.partition(),
                    offset,
                    error = %err,
                    "malformed request payload discarded"
                );
            }
        }
    }
}
