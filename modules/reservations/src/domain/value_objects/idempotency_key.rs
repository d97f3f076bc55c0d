// IdempotencyKey value object - caller-stable deduplication key

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deriving deterministic keys. Fixed for the lifetime of
/// the engine: the same (user, sku, nonce) must hash identically across
/// processes and restarts.
const IDEMPOTENCY_NAMESPACE: Uuid = Uuid::from_u128(0x8f8c_1b7a_4e5d_4b7c_9f3a_2d6e_8a1c_5b4d);

/// Deduplicates retried submissions across client retries, bus
/// redelivery and concurrent submits. Enforced by a unique constraint on
/// the reservations table; the cache is never the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Derives a stable key from the caller-provided fields. Without a
    /// nonce the sale is one-shot per (user, sku): every retry maps to
    /// the same key.
    pub fn derive(user_id: Uuid, sku: &str, nonce: Option<&str>) -> Self {
        let name = match nonce {
            Some(nonce) => format!("{user_id}:{sku}:{nonce}"),
            None => format!("{user_id}:{sku}"),
        };
        Self(Uuid::new_v5(&IDEMPOTENCY_NAMESPACE, name.as_bytes()))
    }

    /// Creates a key from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Converts the key into its underlying UUID
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let user = Uuid::nil();
        let a = IdempotencyKey::derive(user, "SALE-TV-55", Some("nonce-1"));
        let b = IdempotencyKey::derive(user, "SALE-TV-55", Some("nonce-1"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_differs_by_nonce() {
        let user = Uuid::nil();
        let a = IdempotencyKey::derive(user, "SALE-TV-55", Some("nonce-1"));
        let b = IdempotencyKey::derive(user, "SALE-TV-55", Some("nonce-2"));
        let c = IdempotencyKey::derive(user, "SALE-TV-55", None);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_derive_differs_by_sku() {
        let user = Uuid::nil();
        let a = IdempotencyKey::derive(user, "SALE-TV-55", None);
        let b = IdempotencyKey::derive(user, "SALE-TV-65", None);
        assert_ne!(a, b);
    }
}
