// Messaging module errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Bus unavailable")]
    Unavailable,
}
