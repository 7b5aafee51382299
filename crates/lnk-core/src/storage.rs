use crate::error::StorageError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Type alias for storage results.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A key-value store with cache semantics.
///
/// Values are structured JSON; backends apply the serialization codec
/// transparently, so callers only ever see [`Value`]s. Absence is always
/// `None`, never a null sentinel: a key that does not exist and a stored
/// value that decodes to JSON null are both reported as `None`.
///
/// Backends may lose data (TTL expiry, cache eviction); nothing here
/// promises durability. Two implementations exist: a Redis-backed store
/// and an in-memory fake for tests, interchangeable behind this trait.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Get the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Get the values for several keys in one round trip.
    ///
    /// The result is positionally aligned with `keys`: same count, same
    /// order, `None` for each key that does not exist.
    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Value>>>;

    /// Unconditionally upsert `value` under `key`.
    ///
    /// Overwrites any existing value and any existing expiry. A `ttl` of
    /// `None` means the entry never expires.
    async fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<()>;

    /// Delete several keys, returning how many of them existed.
    async fn multi_delete(&self, keys: &[String]) -> Result<u64>;

    /// Liveness probe. Used once at startup; an unreachable backend is
    /// fatal there.
    async fn ping(&self) -> Result<bool>;

    /// Release the backend connection. Called from the shutdown path.
    async fn close(&self) -> Result<()>;
}
