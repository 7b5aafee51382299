//! HTTP client for the remote clipping service.
//!
//! The [`Clipper`](lnk_core::Clipper) capability lives in `lnk-core`;
//! this crate provides the production implementation that talks to the
//! clipping service over HTTP with bounded retries.

pub mod client;
pub mod error;

pub use client::{ClipperConfig, HttpClipper};
pub use error::ClipperError;
