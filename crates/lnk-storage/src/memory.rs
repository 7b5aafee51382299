use crate::codec::{Codec, GzipJsonCodec};
use async_trait::async_trait;
use dashmap::DashMap;
use lnk_core::{Storage, StorageError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

type Result<T> = std::result::Result<T, StorageError>;

/// In-memory implementation of [`Storage`] for tests.
///
/// Entries hold codec-encoded bytes, so everything observable about
/// get/set/multi_get/multi_delete matches the Redis backend byte for
/// byte. The one deliberate difference: ttls are accepted and ignored,
/// nothing ever expires.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<DashMap<String, Vec<u8>>>,
    codec: Arc<GzipJsonCodec>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, for test assertions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let bytes = self.entries.get(key);
        Ok(self.codec.decode(bytes.as_deref().map(Vec::as_slice))?)
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Value>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    async fn set(&self, key: &str, value: &Value, _ttl: Option<Duration>) -> Result<()> {
        match self.codec.encode(Some(value))? {
            Some(bytes) => {
                self.entries.insert(key.to_owned(), bytes);
            }
            None => {
                self.entries.remove(key);
            }
        }
        Ok(())
    }

    async fn multi_delete(&self, keys: &[String]) -> Result<u64> {
        let removed = keys
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
