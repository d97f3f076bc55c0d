// CoordinationCache trait - hot derived state shared between paths

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::CacheError;

/// A rejection payload surfaced to the intake poll loop.
///
/// Serialized as `CODE:message` so the wire format stays greppable in
/// redis-cli during an incident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionMarker {
    pub code: String,
    pub message: String,
}

impl RejectionMarker {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn encode(&self) -> String {
        format!("{}:{}", self.code, self.message)
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let (code, message) = raw.split_once(':')?;
        Some(Self::new(code, message))
    }
}

/// Derived-state cache shared by the intake, allocator, confirm/cancel and
/// expiry paths.
///
/// Counter operations are atomic on the backend; all other keys are plain
/// set/get/delete. Implementations never block a store commit: callers are
/// expected to log and continue on any `CacheError`.
#[async_trait]
pub trait CoordinationCache: Send + Sync {
    /// Reads the cached stock count for a SKU.
    async fn stock(&self, sku: &str) -> Result<Option<i64>, CacheError>;

    /// Replaces the cached stock count.
    async fn set_stock(&self, sku: &str, count: i64, ttl: Duration) -> Result<(), CacheError>;

    /// Atomically adjusts the cached stock count by `delta`.
    ///
    /// A missing key is left missing: the next availability read repopulates
    /// from the store, which is always at least as fresh.
    async fn adjust_stock(&self, sku: &str, delta: i64) -> Result<(), CacheError>;

    /// Reads the cached serialized product payload.
    async fn product(&self, sku: &str) -> Result<Option<String>, CacheError>;

    /// Caches a serialized product payload.
    async fn set_product(&self, sku: &str, payload: &str, ttl: Duration)
        -> Result<(), CacheError>;

    /// Returns true when the user-purchased sentinel is present.
    async fn user_purchased(&self, user_id: Uuid, sku: &str) -> Result<bool, CacheError>;

    /// Sets the user-purchased sentinel.
    async fn set_user_purchased(
        &self,
        user_id: Uuid,
        sku: &str,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Reads the active-reservation marker for a (user, sku) pair.
    async fn active_reservation(&self, user_id: Uuid, sku: &str)
        -> Result<Option<Uuid>, CacheError>;

    /// Writes the active-reservation marker.
    async fn set_active_reservation(
        &self,
        user_id: Uuid,
        sku: &str,
        reservation_id: Uuid,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Clears the active-reservation marker.
    async fn clear_active_reservation(&self, user_id: Uuid, sku: &str) -> Result<(), CacheError>;

    /// Reads the rejection marker for a (user, sku) pair.
    async fn rejection(
        &self,
        user_id: Uuid,
        sku: &str,
    ) -> Result<Option<RejectionMarker>, CacheError>;

    /// Writes a short-lived rejection marker for the intake poll loop.
    async fn set_rejection(
        &self,
        user_id: Uuid,
        sku: &str,
        marker: &RejectionMarker,
        ttl: Duration,
    ) -> Result<(), CacheError>;
}
