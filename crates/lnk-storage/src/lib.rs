//! Storage backends and the value codec for the lnk service.
//!
//! The [`Storage`](lnk_core::Storage) trait lives in `lnk-core`; this
//! crate provides the Redis-backed implementation, the in-memory fake
//! used by tests, and the gzip+JSON codec both apply to stored values.

pub mod codec;
pub mod memory;
pub mod redis;

pub use codec::{Codec, GzipJsonCodec};
pub use memory::MemoryStorage;
pub use redis::RedisStorage;
