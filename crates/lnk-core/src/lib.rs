//! Core types and traits for the lnk URL shortener.
//!
//! This crate provides the shared vocabulary used by the storage
//! backends, the clipper client, and the link service: the uid type,
//! TTL handling, storage-key derivation, and the capability traits the
//! backends implement.

pub mod clipper;
pub mod error;
pub mod flag;
pub mod keys;
pub mod storage;
pub mod ttl;
pub mod uid;

pub use clipper::{ClipContent, Clipper};
pub use error::{CodecError, CoreError, StorageError};
pub use flag::parse_bool;
pub use keys::{clip_key, clip_task_name, link_key};
pub use storage::Storage;
pub use ttl::{parse_ttl, to_seconds, Expiry, TimeUnit, DEFAULT_TTL, NO_EXPIRY_TOKEN};
pub use uid::{Uid, DEFAULT_UID_LEN, RESERVED_UIDS};
