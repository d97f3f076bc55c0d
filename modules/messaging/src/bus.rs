// Bus traits and in-memory implementations
//
// The reservation core talks to these traits only; Kafka implementations
// live in producer.rs. The in-memory variants back unit tests and capture
// published messages for assertions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::messages::{ReservationEventMessage, ReservationRequestMessage};
use crate::MessagingError;

/// Publisher side of the reservation-requests topic.
#[async_trait]
pub trait RequestBus: Send + Sync {
    async fn publish_request(
        &self,
        message: &ReservationRequestMessage,
    ) -> Result<(), MessagingError>;
}

/// Publisher side of the reservation-events topic.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish_event(&self, message: &ReservationEventMessage)
        -> Result<(), MessagingError>;
}

/// Captures published requests in memory.
#[derive(Default)]
pub struct InMemoryRequestBus {
    published: Mutex<Vec<ReservationRequestMessage>>,
    failing: AtomicBool,
}

impl InMemoryRequestBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<ReservationRequestMessage> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl RequestBus for InMemoryRequestBus {
    async fn publish_request(
        &self,
        message: &ReservationRequestMessage,
    ) -> Result<(), MessagingError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessagingError::Unavailable);
        }
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        Ok(())
    }
}

/// Captures published events in memory.
#[derive(Default)]
pub struct InMemoryEventBus {
    published: Mutex<Vec<ReservationEventMessage>>,
    failing: AtomicBool,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<ReservationEventMessage> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish_event(
        &self,
        message: &ReservationEventMessage,
    ) -> Result<(), MessagingError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessagingError::Unavailable);
        }
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        Ok(())
    }
}
