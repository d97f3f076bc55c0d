// Redis implementation of the coordination cache

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::coordination_cache::{CoordinationCache, RejectionMarker};
use crate::keys;
use crate::CacheError;

/// Redis-backed coordination cache.
///
/// Uses a `ConnectionManager` so a broker hiccup is retried transparently
/// and every caller can hold a cheap clone.
#[derive(Clone)]
pub struct RedisCoordinationCache {
    conn: ConnectionManager,
}

impl RedisCoordinationCache {
    /// Connects to Redis and prepares the managed connection.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_tokio_connection_manager().await?;
        Ok(Self { conn })
    }
}

fn ttl_secs(ttl: Duration) -> usize {
    // Redis EX of 0 is an error; clamp sub-second TTLs up to one second.
    ttl.as_secs().max(1) as usize
}

#[async_trait]
impl CoordinationCache for RedisCoordinationCache {
    async fn stock(&self, sku: &str) -> Result<Option<i64>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(keys::stock_key(sku)).await?)
    }

    async fn set_stock(&self, sku: &str, count: i64, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(keys::stock_key(sku), count, ttl_secs(ttl))
            .await?;
        Ok(())
    }

    async fn adjust_stock(&self, sku: &str, delta: i64) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let key = keys::stock_key(sku);
        // INCRBY on a missing key would materialize a bogus count equal to
        // the delta; only adjust when the availability path populated it.
        let present: bool = conn.exists(&key).await?;
        if present {
            let _: i64 = conn.incr(&key, delta).await?;
        }
        Ok(())
    }

    async fn product(&self, sku: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(keys::product_key(sku)).await?)
    }

    async fn set_product(
        &self,
        sku: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(keys::product_key(sku), payload, ttl_secs(ttl))
            .await?;
        Ok(())
    }

    async fn user_purchased(&self, user_id: Uuid, sku: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(keys::user_purchased_key(user_id, sku)).await?)
    }

    async fn set_user_purchased(
        &self,
        user_id: Uuid,
        sku: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(keys::user_purchased_key(user_id, sku), 1, ttl_secs(ttl))
            .await?;
        Ok(())
    }

    async fn active_reservation(
        &self,
        user_id: Uuid,
        sku: &str,
    ) -> Result<Option<Uuid>, CacheError> {
        let mut conn = self.conn.clone();
        let key = keys::active_reservation_key(user_id, sku);
        let raw: Option<String> = conn.get(&key).await?;
        match raw {
            Some(value) => Uuid::parse_str(&value)
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
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(
                keys::active_reservation_key(user_id, sku),
                reservation_id.to_string(),
                ttl_secs(ttl),
            )
            .await?;
        Ok(())
    }

    async fn clear_active_reservation(&self, user_id: Uuid, sku: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(keys::active_reservation_key(user_id, sku)).await?;
        Ok(())
    }

    async fn rejection(
        &self,
        user_id: Uuid,
        sku: &str,
    ) -> Result<Option<RejectionMarker>, CacheError> {
        let mut conn = self.conn.clone();
        let key = keys::rejection_key(user_id, sku);
        let raw: Option<String> = conn.get(&key).await?;
        match raw {
            Some(value) => RejectionMarker::decode(&value)
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
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(
                keys::rejection_key(user_id, sku),
                marker.encode(),
                ttl_secs(ttl),
            )
            .await?;
        Ok(())
    }
}
