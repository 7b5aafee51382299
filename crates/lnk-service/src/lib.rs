//! Link lifecycle orchestration for the lnk URL shortener.
//!
//! This crate ties the storage backend, the clipper client, and the
//! in-flight job registry together into the [`LinkService`]: creation
//! with validation, redirects, clip reads with in-progress detection,
//! and deletion. [`App`] carries the startup/shutdown sequence the
//! embedding HTTP layer drives.

pub mod app;
pub mod error;
pub mod inflight;
pub mod params;
pub mod service;

pub use app::{App, Config, StorageBackend};
pub use error::ServiceError;
pub use inflight::InflightJobs;
pub use params::{CreateParams, CreateRequest};
pub use service::{ClipView, LinkService};
