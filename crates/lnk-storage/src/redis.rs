use crate::codec::{Codec, GzipJsonCodec};
use async_trait::async_trait;
use lnk_core::{Storage, StorageError};
use redis::AsyncCommands;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Type alias for storage results.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A Redis-backed implementation of [`Storage`].
///
/// Values go through the codec on the way in and out; Redis only ever
/// sees opaque byte strings. Expiry is delegated to Redis via `SET ..
/// EX`, so an entry written with a ttl disappears from `get`/`multi_get`
/// without any bookkeeping here.
#[derive(Clone)]
pub struct RedisStorage {
    conn: redis::aio::MultiplexedConnection,
    codec: Arc<dyn Codec>,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> StorageError {
    let message = format!("{operation}: {err}");
    if message.to_ascii_lowercase().contains("timed out") {
        StorageError::Timeout(message)
    } else {
        StorageError::Operation(message)
    }
}

impl RedisStorage {
    /// Creates a Redis storage over an established connection, with the
    /// default gzip+JSON codec.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_codec(conn, GzipJsonCodec::new())
    }

    /// Creates a Redis storage with a custom codec.
    pub fn with_codec(conn: redis::aio::MultiplexedConnection, codec: impl Codec) -> Self {
        Self {
            conn,
            codec: Arc::new(codec),
        }
    }

    /// Connects to a Redis server and wraps it in a storage.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let url = format!("redis://{host}:{port}");
        let client = redis::Client::open(url.as_str())
            .map_err(|e| StorageError::Initialization(format!("invalid redis target: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StorageError::Unavailable(format!("cannot connect to redis: {e}")))?;

        debug!(host, port, "connected to redis");

        Ok(Self::new(conn))
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        trace!(key, "fetching value from redis");

        let mut conn = self.conn.clone();
        let bytes = conn
            .get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(|e| map_redis_error("failed to fetch value from redis", e))?;

        self.codec.decode(bytes.as_deref()).map_err(|e| {
            warn!(key, error = %e, "stored value is corrupt");
            StorageError::from(e)
        })
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Value>>> {
        trace!(?keys, "fetching values from redis");

        let mut conn = self.conn.clone();
        let values = conn
            .mget::<_, Vec<Option<Vec<u8>>>>(keys)
            .await
            .map_err(|e| map_redis_error("failed to fetch values from redis", e))?;

        keys.iter()
            .zip(&values)
            .map(|(key, bytes)| {
                self.codec.decode(bytes.as_deref()).map_err(|e| {
                    warn!(key = %key, error = %e, "stored value is corrupt");
                    StorageError::from(e)
                })
            })
            .collect()
    }

    async fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<()> {
        trace!(key, ?ttl, "storing value in redis");

        let mut conn = self.conn.clone();
        let result = match self.codec.encode(Some(value))? {
            Some(bytes) => match ttl {
                Some(ttl) => conn.set_ex::<_, _, ()>(key, bytes, ttl.as_secs()).await,
                None => conn.set::<_, _, ()>(key, bytes).await,
            },
            // A null-equivalent value is stored as absence.
            None => conn.del::<_, ()>(key).await,
        };

        result.map_err(|e| {
            warn!(key, error = %e, "failed to write value to redis");
            map_redis_error("failed to write value to redis", e)
        })
    }

    async fn multi_delete(&self, keys: &[String]) -> Result<u64> {
        trace!(?keys, "deleting keys from redis");

        let mut conn = self.conn.clone();
        let removed = conn
            .del::<_, u64>(keys)
            .await
            .map_err(|e| map_redis_error("failed to delete keys from redis", e))?;

        debug!(?keys, removed, "deleted keys from redis");

        Ok(removed)
    }

    async fn ping(&self) -> Result<bool> {
        let mut conn = self.conn.clone();
        let pong = redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| StorageError::Unavailable(format!("redis ping failed: {e}")))?;

        Ok(pong.eq_ignore_ascii_case("pong"))
    }

    async fn close(&self) -> Result<()> {
        // The multiplexed connection shuts down when the last clone is
        // dropped; this is the explicit, logged shutdown point.
        debug!("redis storage closed");
        Ok(())
    }
}
