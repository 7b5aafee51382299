use async_trait::async_trait;
use std::collections::HashMap;

/// Snapshot of a clipped page: named content fields (title, text,
/// html, ...) as produced by the remote clipping service.
pub type ClipContent = HashMap<String, String>;

/// Capability to fetch a content snapshot for a URL.
///
/// `clip` is total: transport errors, server errors, and exhausted
/// retries all come back as `None`. The caller only distinguishes
/// "snapshot produced" from "no snapshot".
#[async_trait]
pub trait Clipper: Send + Sync + 'static {
    /// Fetch a snapshot of the page at `url`.
    async fn clip(&self, url: &str) -> Option<ClipContent>;

    /// Release the client session. Called from the shutdown path.
    async fn close(&self) {}
}
