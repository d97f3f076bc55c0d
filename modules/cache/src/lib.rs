// Coordination cache for the flash-sale engine
//
// Holds hot derived state: stock counts, active-reservation markers,
// user-purchased markers and short-lived rejection payloads. The cache is
// a discardable view; the store remains the source of truth, and every
// caller treats cache failures as advisory.

pub mod coordination_cache;
pub mod error;
pub mod keys;
pub mod memory_cache;
pub mod redis_cache;

pub use coordination_cache::{CoordinationCache, RejectionMarker};
pub use error::CacheError;
pub use memory_cache::InMemoryCoordinationCache;
pub use redis_cache::RedisCoordinationCache;
