// Cache module errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Cache unavailable")]
    Unavailable,

    #[error("Malformed cache payload under key '{0}'")]
    MalformedPayload(String),
}
