// In-memory implementation of the coordination cache
//
// Used by unit tests and local runs without a Redis instance. Supports a
// fail-mode switch so tests can exercise cache-outage degradation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::coordination_cache::{CoordinationCache, RejectionMarker};
use crate::keys;
use crate::CacheError;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn live(&self) -> bool {
        self.expires_at.is_none_or(|deadline| Instant::now() < deadline)
    }
}

/// Process-local coordination cache with TTL semantics.
#[derive(Default)]
pub struct InMemoryCoordinationCache {
    entries: Mutex<HashMap<String, Entry>>,
    failing: AtomicBool,
}

impl InMemoryCoordinationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every operation returns `CacheError::Unavailable` until
    /// cleared. Lets tests simulate a cache outage window.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.live() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: String, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.check_available()?;
        let entry = Entry {
            value,
            expires_at: ttl.map(|t| Instant::now() + t),
        };
        self.entries.lock().await.insert(key, entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.check_available()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl CoordinationCache for InMemoryCoordinationCache {
    async fn stock(&self, sku: &str) -> Result<Option<i64>, CacheError> {
        let key = keys::stock_key(sku);
        match self.get(&key).await? {
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| CacheError::MalformedPayload(key)),
            None => Ok(None),
        }
    }

    async fn set_stock(&self, sku: &str, count: i64, ttl: Duration) -> Result<(), CacheError> {
        self.set(keys::stock_key(sku), count.to_string(), Some(ttl))
            .await
    }

    async fn adjust_stock(&self, sku: &str, delta: i64) -> Result<(), CacheError> {
        self.check_available()?;
        let key = keys::stock_key(sku);
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(&key) {
            if entry.live() {
                let current: i64 = entry
                    .value
                    .parse()
                    .map_err(|_| CacheError::MalformedPayload(key.clone()))?;
                entry.value = (current + delta).to_string();
            } else {
                entries.remove(&key);
            }
        }
        Ok(())
    }

    async fn product(&self, sku: &str) -> Result<Option<String>, CacheError> {
        self.get(&keys::product_key(sku)).await
    }

    async fn set_product(
        &self,
        sku: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set(keys::product_key(sku), payload.to_string(), Some(ttl))
            .await
    }

    async fn user_purchased(&self, user_id: Uuid, sku: &str) -> Result<bool, CacheError> {
        Ok(self
            .get(&keys::user_purchased_key(user_id, sku))
            .await?
            .is_some())
    }

    async fn set_user_purchased(
        &self,
        user_id: Uuid,
        sku: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set(keys::user_purchased_key(user_id, sku), "1".into(), Some(ttl))
            .await
    }

    async fn active_reservation(
        &self,
        user_id: Uuid,
        sku: &str,
    ) -> Result<Option<Uuid>, CacheError> {
        let key = keys::active_reservation_key(user_id, sku);
        match self.get(&key).await? {
            Some(raw) => Uuid::parse_str(&raw)
                .map(Some)
                .map_err(|_| CacheError::MalformedPayload(key)),
            None => Ok(None),
        }
    }

    async fn set_active_reservation(
        &self,
        user_id: Uuid,
        sku: &str,
        reservation_id: Uuid,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set(
            keys::active_reservation_key(user_id, sku),
            reservation_id.to_string(),
            Some(ttl),
        )
        .await
    }

    async fn clear_active_reservation(&self, user_id: Uuid, sku: &str) -> Result<(), CacheError> {
        self.remove(&keys::active_reservation_key(user_id, sku)).await
    }

    async fn rejection(
        &self,
        user_id: Uuid,
        sku: &str,
    ) -> Result<Option<RejectionMarker>, CacheError> {
        let key = keys::rejection_key(user_id, sku);
        match self.get(&key).await? {
            Some(raw) => RejectionMarker::decode(&raw)
                .map(Some)
                .ok_or(CacheError::MalformedPayload(key)),
            None => Ok(None),
        }
    }

    async fn set_rejection(
        &self,
        user_id: Uuid,
        sku: &str,
        marker: &RejectionMarker,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set(keys::rejection_key(user_id, sku), marker.encode(), Some(ttl))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stock_set_get_adjust() {
        let cache = InMemoryCoordinationCache::new();
        cache
            .set_stock("SKU-1", 10, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.stock("SKU-1").await.unwrap(), Some(10));

        cache.adjust_stock("SKU-1", -3).await.unwrap();
        assert_eq!(cache.stock("SKU-1").await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_adjust_missing_key_is_noop() {
        let cache = InMemoryCoordinationCache::new();
        cache.adjust_stock("SKU-MISSING", -1).await.unwrap();
        assert_eq!(cache.stock("SKU-MISSING").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = InMemoryCoordinationCache::new();
        cache
            .set_stock("SKU-1", 5, Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.stock("SKU-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_active_reservation_round_trip() {
        let cache = InMemoryCoordinationCache::new();
        let user = Uuid::nil();
        let reservation = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        cache
            .set_active_reservation(user, "SKU-1", reservation, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            cache.active_reservation(user, "SKU-1").await.unwrap(),
            Some(reservation)
        );

        cache.clear_active_reservation(user, "SKU-1").await.unwrap();
        assert_eq!(cache.active_reservation(user, "SKU-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fail_mode() {
        let cache = InMemoryCoordinationCache::new();
        cache.set_failing(true);
        assert!(matches!(
            cache.stock("SKU-1").await,
            Err(CacheError::Unavailable)
        ));
        cache.set_failing(false);
        assert_eq!(cache.stock("SKU-1").await.unwrap(), None);
    }
}
