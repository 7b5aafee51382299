use crate::error::{Result, ServiceError};
use crate::inflight::InflightJobs;
use crate::params::{CreateParams, CreateRequest};
use lnk_core::{
    clip_key, clip_task_name, link_key, ClipContent, Clipper, Expiry, Storage, StorageError, Uid,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A link together with its snapshot, as returned by [`LinkService::clip`].
///
/// `content` is `None` when clipping was never requested or the remote
/// fetch produced nothing; the link itself is still valid.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipView {
    pub url: String,
    pub content: Option<ClipContent>,
}

/// The link lifecycle orchestrator.
///
/// Owns the in-flight job registry and coordinates the storage backend
/// and the clipper client. Creation returns as soon as the link record
/// is written; snapshot capture runs in a background job, at most one
/// per uid at a time.
#[derive(Clone)]
pub struct LinkService {
    storage: Arc<dyn Storage>,
    clipper: Arc<dyn Clipper>,
    jobs: InflightJobs,
}

impl LinkService {
    pub fn new(storage: Arc<dyn Storage>, clipper: Arc<dyn Clipper>) -> Self {
        Self {
            storage,
            clipper,
            jobs: InflightJobs::new(),
        }
    }

    /// Creates (or overwrites) a link and returns its uid.
    ///
    /// The link record is written before this returns; when clipping
    /// was requested the background job is registered and started, but
    /// not awaited. A create for a uid whose clip job is still running
    /// keeps the running job rather than starting a second one.
    pub async fn shorten(&self, request: CreateRequest) -> Result<Uid> {
        let CreateParams {
            url,
            uid,
            expiry,
            clip,
        } = CreateParams::validate(request)?;

        self.storage
            .set(&link_key(uid.as_str()), &Value::String(url.clone()), expiry.as_ttl())
            .await?;

        debug!(uid = %uid, "link created");

        if clip {
            self.spawn_clip_job(&uid, url, expiry);
        }

        Ok(uid)
    }

    /// Resolves a uid to its target URL. Independent of clip state.
    pub async fn resolve(&self, uid: &str) -> Result<Option<String>> {
        trace!(uid, "resolving link");

        let key = link_key(uid);
        match self.storage.get(&key).await? {
            None => Ok(None),
            Some(value) => Ok(Some(url_from_value(&key, value)?)),
        }
    }

    /// Reads the link and its snapshot together.
    ///
    /// Fails with [`ServiceError::StillProcessing`] while the uid's
    /// background job is registered, without touching storage. Returns
    /// `None` when no link record exists.
    pub async fn clip(&self, uid: &str) -> Result<Option<ClipView>> {
        if self.jobs.contains(&clip_task_name(uid)) {
            debug!(uid, "clip still in flight");
            return Err(ServiceError::StillProcessing(uid.to_owned()));
        }

        let keys = [link_key(uid), clip_key(uid)];
        let mut values = self.storage.multi_get(&keys).await?;
        if values.len() != 2 {
            return Err(StorageError::Operation(format!(
                "multi_get returned {} values for 2 keys",
                values.len()
            ))
            .into());
        }

        let clip_value = values.pop().flatten();
        let link_value = values.pop().flatten();

        let Some(link_value) = link_value else {
            return Ok(None);
        };
        let url = url_from_value(&keys[0], link_value)?;

        let content = match clip_value {
            None => None,
            Some(value) => Some(serde_json::from_value::<ClipContent>(value).map_err(|e| {
                StorageError::InvalidData(format!("clip record for '{}': {e}", keys[1]))
            })?),
        };

        Ok(Some(ClipView { url, content }))
    }

    /// Removes the link and its snapshot, reporting whether anything
    /// existed.
    pub async fn delete(&self, uid: &str) -> Result<bool> {
        let keys = [link_key(uid), clip_key(uid)];
        let removed = self.storage.multi_delete(&keys).await?;

        debug!(uid, removed, "link deleted");

        Ok(removed > 0)
    }

    /// Whether a clip job for this uid is currently in flight.
    pub fn clip_pending(&self, uid: &str) -> bool {
        self.jobs.contains(&clip_task_name(uid))
    }

    fn spawn_clip_job(&self, uid: &Uid, url: String, expiry: Expiry) {
        let name = clip_task_name(uid.as_str());
        let key = clip_key(uid.as_str());
        let storage = Arc::clone(&self.storage);
        let clipper = Arc::clone(&self.clipper);
        let job_uid = uid.clone();

        let registered = self.jobs.spawn(&name, async move {
            let content = clipper.clip(&url).await;

            // A failed or empty snapshot writes nothing; the clip key
            // simply stays absent.
            let Some(content) = content.filter(|content| !content.is_empty()) else {
                debug!(uid = %job_uid, "no snapshot produced");
                return;
            };

            let value = match serde_json::to_value(&content) {
                Ok(value) => value,
                Err(e) => {
                    warn!(uid = %job_uid, error = %e, "failed to encode snapshot");
                    return;
                }
            };

            match storage.set(&key, &value, expiry.as_ttl()).await {
                Ok(()) => debug!(uid = %job_uid, "snapshot stored"),
                Err(e) => warn!(uid = %job_uid, error = %e, "failed to store snapshot"),
            }
        });

        if !registered {
            debug!(uid = %uid, "clip job already running, request coalesced");
        }
    }
}

fn url_from_value(key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(url) => Ok(url),
        other => Err(StorageError::InvalidData(format!(
            "link record for '{key}' is not a string: {other}"
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lnk_core::DEFAULT_UID_LEN;
    use lnk_storage::MemoryStorage;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Clipper fake: waits for the gate, then serves the canned
    /// snapshot, counting every call.
    struct FakeClipper {
        content: Option<ClipContent>,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
    }

    impl FakeClipper {
        fn serving(content: ClipContent) -> Self {
            Self {
                content: Some(content),
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                content: None,
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn gated(content: ClipContent, gate: Arc<Notify>) -> Self {
            Self {
                content: Some(content),
                gate: Some(gate),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Clipper for FakeClipper {
        async fn clip(&self, _url: &str) -> Option<ClipContent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.content.clone()
        }
    }

    fn snapshot() -> ClipContent {
        HashMap::from([("title".to_owned(), "a page".to_owned())])
    }

    fn service_with(clipper: Arc<FakeClipper>) -> (LinkService, MemoryStorage) {
        let storage = MemoryStorage::new();
        let service = LinkService::new(Arc::new(storage.clone()), clipper);
        (service, storage)
    }

    async fn wait_for_clip(service: &LinkService, uid: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while service.clip_pending(uid) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("clip job did not finish in time");
    }

    #[tokio::test]
    async fn shorten_then_resolve() {
        let (service, _) = service_with(Arc::new(FakeClipper::failing()));

        let uid = service.shorten(CreateRequest::new("test_url")).await.unwrap();

        assert_eq!(uid.as_str().len(), DEFAULT_UID_LEN);
        assert_eq!(
            service.resolve(uid.as_str()).await.unwrap(),
            Some("test_url".to_owned())
        );
    }

    #[tokio::test]
    async fn resolve_unknown_uid() {
        let (service, _) = service_with(Arc::new(FakeClipper::failing()));
        assert_eq!(service.resolve("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn shorten_overwrites_existing_uid() {
        let (service, _) = service_with(Arc::new(FakeClipper::failing()));

        let mut request = CreateRequest::new("first_url");
        request.uid = Some("test_uid".into());
        service.shorten(request.clone()).await.unwrap();

        request.url = Some("second_url".into());
        service.shorten(request).await.unwrap();

        assert_eq!(
            service.resolve("test_uid").await.unwrap(),
            Some("second_url".to_owned())
        );
    }

    #[tokio::test]
    async fn delete_removes_link() {
        let (service, _) = service_with(Arc::new(FakeClipper::failing()));

        let uid = service.shorten(CreateRequest::new("test_url")).await.unwrap();

        assert!(service.delete(uid.as_str()).await.unwrap());
        assert_eq!(service.resolve(uid.as_str()).await.unwrap(), None);
        assert!(!service.delete(uid.as_str()).await.unwrap());
    }

    #[tokio::test]
    async fn clip_without_request_has_no_content() {
        let (service, _) = service_with(Arc::new(FakeClipper::failing()));

        let mut request = CreateRequest::new("test_url");
        request.uid = Some("test_uid".into());
        service.shorten(request).await.unwrap();

        let view = service.clip("test_uid").await.unwrap().unwrap();
        assert_eq!(view.url, "test_url");
        assert_eq!(view.content, None);
    }

    #[tokio::test]
    async fn clip_for_unknown_uid_is_none() {
        let (service, _) = service_with(Arc::new(FakeClipper::failing()));
        assert_eq!(service.clip("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clip_reports_still_processing_then_content() {
        let gate = Arc::new(Notify::new());
        let clipper = Arc::new(FakeClipper::gated(snapshot(), Arc::clone(&gate)));
        let (service, _) = service_with(Arc::clone(&clipper));

        let mut request = CreateRequest::new("test_url");
        request.uid = Some("test_uid".into());
        request.clip = Some("true".into());
        service.shorten(request).await.unwrap();

        let err = service.clip("test_uid").await.unwrap_err();
        assert!(matches!(err, ServiceError::StillProcessing(_)));

        // The redirect path is independent of the pending clip.
        assert_eq!(
            service.resolve("test_uid").await.unwrap(),
            Some("test_url".to_owned())
        );

        gate.notify_one();
        wait_for_clip(&service, "test_uid").await;

        let view = service.clip("test_uid").await.unwrap().unwrap();
        assert_eq!(view.url, "test_url");
        assert_eq!(view.content, Some(snapshot()));
    }

    #[tokio::test]
    async fn failed_clip_leaves_content_absent() {
        let clipper = Arc::new(FakeClipper::failing());
        let (service, storage) = service_with(Arc::clone(&clipper));

        let mut request = CreateRequest::new("test_url");
        request.uid = Some("test_uid".into());
        request.clip = Some("yes".into());
        service.shorten(request).await.unwrap();

        wait_for_clip(&service, "test_uid").await;
        assert_eq!(clipper.calls(), 1);

        let view = service.clip("test_uid").await.unwrap().unwrap();
        assert_eq!(view.content, None);
        // Only the link record exists.
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn empty_snapshot_writes_no_record() {
        let clipper = Arc::new(FakeClipper::serving(ClipContent::new()));
        let (service, storage) = service_with(Arc::clone(&clipper));

        let mut request = CreateRequest::new("test_url");
        request.uid = Some("test_uid".into());
        request.clip = Some("1".into());
        service.shorten(request).await.unwrap();

        wait_for_clip(&service, "test_uid").await;

        let view = service.clip("test_uid").await.unwrap().unwrap();
        assert_eq!(view.content, None);
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_creates_spawn_one_job() {
        let gate = Arc::new(Notify::new());
        let clipper = Arc::new(FakeClipper::gated(snapshot(), Arc::clone(&gate)));
        let (service, _) = service_with(Arc::clone(&clipper));

        let mut request = CreateRequest::new("test_url");
        request.uid = Some("test_uid".into());
        request.clip = Some("true".into());

        service.shorten(request.clone()).await.unwrap();
        service.shorten(request.clone()).await.unwrap();
        service.shorten(request).await.unwrap();

        gate.notify_one();
        wait_for_clip(&service, "test_uid").await;

        assert_eq!(clipper.calls(), 1);
    }

    #[tokio::test]
    async fn clip_job_can_rerun_after_completion() {
        let clipper = Arc::new(FakeClipper::serving(snapshot()));
        let (service, _) = service_with(Arc::clone(&clipper));

        let mut request = CreateRequest::new("test_url");
        request.uid = Some("test_uid".into());
        request.clip = Some("true".into());

        service.shorten(request.clone()).await.unwrap();
        wait_for_clip(&service, "test_uid").await;

        service.shorten(request).await.unwrap();
        wait_for_clip(&service, "test_uid").await;

        assert_eq!(clipper.calls(), 2);
    }

    #[tokio::test]
    async fn delete_removes_clip_record_too() {
        let clipper = Arc::new(FakeClipper::serving(snapshot()));
        let (service, storage) = service_with(Arc::clone(&clipper));

        let mut request = CreateRequest::new("test_url");
        request.uid = Some("test_uid".into());
        request.clip = Some("true".into());
        service.shorten(request).await.unwrap();
        wait_for_clip(&service, "test_uid").await;

        assert_eq!(storage.len(), 2);
        assert!(service.delete("test_uid").await.unwrap());
        assert!(storage.is_empty());
        assert_eq!(service.clip("test_uid").await.unwrap(), None);
    }
}
