// Partitioned bus adapter for the flash-sale engine
//
// Wraps rdkafka behind small traits so the reservation core stays testable
// without a broker. Requests are keyed by SKU: the Kafka partitioner maps
// every message for one SKU onto the same partition, and the consumer
// group protocol guarantees a single consumer per partition. Together
// those give the single-writer-per-SKU discipline the allocator relies on.

pub mod bus;
pub mod consumer;
pub mod error;
pub mod messages;
pub mod producer;
pub mod topics;

pub use bus::{EventBus, InMemoryEventBus, InMemoryRequestBus, RequestBus};
pub use consumer::{RequestBatch, RequestBatchConsumer};
pub use error::MessagingError;
pub use messages::{ReservationEventKind, ReservationEventMessage, ReservationRequestMessage};
pub use producer::{KafkaEventProducer, KafkaRequestProducer};
