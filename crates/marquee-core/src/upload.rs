// ── Upload pipeline ──
//
// Accepts a selection of local files, pushes each to the blob store and
// reports the resulting URLs in selection order. Each selection is its own
// batch running on its own task; a pipeline that has been unmounted stops
// writing job state and emitting events, even for uploads already in
// flight.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures_util::future::join_all;
use serde::Serialize;
use strum::Display;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use marquee_api::CatalogClient;

use crate::error::CoreError;

/// Uploads allowed to run at once per pipeline. Extra jobs wait as
/// `Queued`.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

// ── Files & MIME filtering ──────────────────────────────────────────

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| "upload".into(), |n| n.to_string_lossy().into_owned());
        let mime = mime_for_extension(path).to_owned();
        Ok(Self {
            name,
            mime,
            bytes: Bytes::from(bytes),
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// MIME type for common poster / trailer / subtitle extensions.
pub fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "vtt" => "text/vtt",
        "srt" => "application/x-subrip",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Allow-list of MIME types. Entries are exact (`image/png`), type
/// wildcards (`image/*`) or `*/*`. An empty set accepts nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptSet(Vec<String>);

impl AcceptSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        )
    }

    pub fn allows(&self, mime: &str) -> bool {
        let mime = mime.trim().to_ascii_lowercase();
        // Ignore parameters such as `; charset=utf-8`.
        let essence = mime.split(';').next().unwrap_or_default().trim();
        let Some((kind, _)) = essence.split_once('/') else {
            return false;
        };
        self.0.iter().any(|pattern| match pattern.strip_suffix("/*") {
            Some("*") => true,
            Some(prefix) => prefix == kind,
            None => pattern == essence,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.0
    }
}

// ── Transport ───────────────────────────────────────────────────────

/// Where uploaded bytes go. Failures are a single message.
#[async_trait]
pub trait BlobTransport: Send + Sync {
    async fn upload(&self, file: &LocalFile) -> Result<Url, CoreError>;
}

/// [`BlobTransport`] over the catalog API's `uploads` endpoint.
pub struct RemoteBlobStore {
    client: Arc<CatalogClient>,
}

impl RemoteBlobStore {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobTransport for RemoteBlobStore {
    async fn upload(&self, file: &LocalFile) -> Result<Url, CoreError> {
        self.client
            .upload_blob(&file.name, &file.mime, file.bytes.clone())
            .await
            .map_err(|e| CoreError::UploadFailed {
                file: file.name.clone(),
                message: CoreError::from(e).to_string(),
            })
    }
}

// ── Jobs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Queued,
    Uploading,
    Done,
    Failed,
}

/// One file's progress.
#[derive(Debug, Clone, Serialize)]
pub struct UploadJob {
    pub id: Uuid,
    pub batch: Uuid,
    /// Position within the selection.
    pub index: usize,
    /// Pipeline-wide selection order, for display sorting.
    pub seq: u64,
    pub file_name: String,
    pub mime: String,
    pub size: usize,
    pub status: UploadStatus,
    pub result_url: Option<Url>,
    pub error: Option<String>,
}

/// Handle for one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBatch {
    pub id: Uuid,
    pub jobs: Vec<Uuid>,
}

/// Completion signal for a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// Every file uploaded; URLs are in selection order.
    Completed { batch: Uuid, urls: Vec<Url> },
    /// The selection was rejected or at least one upload failed.
    Failed { batch: Uuid, message: String },
}

// ── Pipeline ────────────────────────────────────────────────────────

/// Owner of a form's upload jobs.
pub struct UploadPipeline {
    transport: Arc<dyn BlobTransport>,
    accept: AcceptSet,
    jobs: Arc<DashMap<Uuid, UploadJob>>,
    events: mpsc::UnboundedSender<UploadEvent>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    seq: AtomicU64,
}

impl UploadPipeline {
    /// A pipeline and the receiver its batch events arrive on.
    pub fn new(
        transport: Arc<dyn BlobTransport>,
        accept: AcceptSet,
    ) -> (Self, mpsc::UnboundedReceiver<UploadEvent>) {
        Self::with_concurrency(transport, accept, DEFAULT_MAX_CONCURRENT)
    }

    pub fn with_concurrency(
        transport: Arc<dyn BlobTransport>,
        accept: AcceptSet,
        max_concurrent: usize,
    ) -> (Self, mpsc::UnboundedReceiver<UploadEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let pipeline = Self {
            transport,
            accept,
            jobs: Arc::new(DashMap::new()),
            events,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            cancel: CancellationToken::new(),
            seq: AtomicU64::new(0),
        };
        (pipeline, rx)
    }

    pub fn accept(&self) -> &AcceptSet {
        &self.accept
    }

    /// Start uploading `files` as one batch.
    ///
    /// A selection containing any file outside the accept set is rejected
    /// whole: nothing is uploaded and a `Failed` event is emitted.
    /// Must be called from within a Tokio runtime.
    pub fn handle_file_select(&self, files: Vec<LocalFile>) -> Result<UploadBatch, CoreError> {
        let batch = Uuid::new_v4();

        if self.cancel.is_cancelled() {
            return Err(CoreError::Internal("upload pipeline was unmounted".into()));
        }
        if let Some(bad) = files.iter().find(|f| !self.accept.allows(&f.mime)) {
            let err = CoreError::UnsupportedMediaType {
                file: bad.name.clone(),
                mime: bad.mime.clone(),
            };
            warn!(file = %bad.name, mime = %bad.mime, "rejecting upload selection");
            let _ = self.events.send(UploadEvent::Failed {
                batch,
                message: err.to_string(),
            });
            return Err(err);
        }

        let ids: Vec<Uuid> = files
            .iter()
            .enumerate()
            .map(|(index, file)| {
                let id = Uuid::new_v4();
                self.jobs.insert(
                    id,
                    UploadJob {
                        id,
                        batch,
                        index,
                        seq: self.seq.fetch_add(1, Ordering::Relaxed),
                        file_name: file.name.clone(),
                        mime: file.mime.clone(),
                        size: file.size(),
                        status: UploadStatus::Queued,
                        result_url: None,
                        error: None,
                    },
                );
                id
            })
            .collect();

        info!(%batch, files = files.len(), "upload batch queued");
        tokio::spawn(run_batch(
            BatchContext {
                batch,
                transport: Arc::clone(&self.transport),
                jobs: Arc::clone(&self.jobs),
                events: self.events.clone(),
                permits: Arc::clone(&self.permits),
                cancel: self.cancel.child_token(),
            },
            files,
            ids.clone(),
        ));

        Ok(UploadBatch { id: batch, jobs: ids })
    }

    /// Snapshot of every live job, in selection order.
    pub fn jobs(&self) -> Vec<UploadJob> {
        let mut jobs: Vec<UploadJob> = self.jobs.iter().map(|e| e.value().clone()).collect();
        jobs.sort_by_key(|j| j.seq);
        jobs
    }

    pub fn job(&self, id: Uuid) -> Option<UploadJob> {
        self.jobs.get(&id).map(|j| j.clone())
    }

    /// Take the finished URLs of `batch` and forget its jobs. Returns
    /// `None` until every job in the batch is done.
    pub fn consume(&self, batch: &UploadBatch) -> Option<Vec<Url>> {
        let urls: Option<Vec<Url>> = batch
            .jobs
            .iter()
            .map(|id| {
                self.jobs
                    .get(id)
                    .filter(|j| j.status == UploadStatus::Done)
                    .and_then(|j| j.result_url.clone())
            })
            .collect();
        if urls.is_some() {
            for id in &batch.jobs {
                self.jobs.remove(id);
            }
        }
        urls
    }

    /// Tear down: in-flight batches stop writing and emit nothing further.
    pub fn unmount(&self) {
        if !self.cancel.is_cancelled() {
            debug!(jobs = self.jobs.len(), "unmounting upload pipeline");
            self.cancel.cancel();
        }
        self.jobs.clear();
    }
}

impl Drop for UploadPipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct BatchContext {
    batch: Uuid,
    transport: Arc<dyn BlobTransport>,
    jobs: Arc<DashMap<Uuid, UploadJob>>,
    events: mpsc::UnboundedSender<UploadEvent>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl BatchContext {
    /// Apply `f` to a job unless the owner is gone.
    fn update(&self, id: Uuid, f: impl FnOnce(&mut UploadJob)) {
        if self.cancel.is_cancelled() {
            return;
        }
        if let Some(mut job) = self.jobs.get_mut(&id) {
            f(&mut job);
        }
    }

    async fn upload_one(&self, id: Uuid, file: &LocalFile) -> Result<Url, CoreError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CoreError::Internal("upload pipeline closed".into()))?;
        self.update(id, |j| j.status = UploadStatus::Uploading);
        debug!(batch = %self.batch, file = %file.name, "uploading");

        let result = self.transport.upload(file).await;
        match &result {
            Ok(url) => self.update(id, |j| {
                j.status = UploadStatus::Done;
                j.result_url = Some(url.clone());
            }),
            Err(err) => {
                let message = err.to_string();
                self.update(id, |j| {
                    j.status = UploadStatus::Failed;
                    j.error = Some(message);
                });
            }
        }
        result
    }
}

async fn run_batch(ctx: BatchContext, files: Vec<LocalFile>, ids: Vec<Uuid>) {
    let uploads = files
        .iter()
        .zip(&ids)
        .map(|(file, id)| ctx.upload_one(*id, file));

    let results = tokio::select! {
        biased;
        () = ctx.cancel.cancelled() => {
            debug!(batch = %ctx.batch, "owner unmounted; dropping batch");
            return;
        }
        results = join_all(uploads) => results,
    };

    if ctx.cancel.is_cancelled() {
        return;
    }

    let event = match results.into_iter().collect::<Result<Vec<Url>, CoreError>>() {
        Ok(urls) => {
            info!(batch = %ctx.batch, files = urls.len(), "upload batch complete");
            UploadEvent::Completed {
                batch: ctx.batch,
                urls,
            }
        }
        Err(err) => {
            warn!(batch = %ctx.batch, error = %err, "upload batch failed");
            UploadEvent::Failed {
                batch: ctx.batch,
                message: err.to_string(),
            }
        }
    };
    let _ = ctx.events.send(event);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Uploads take longer the earlier the file appears in its name
    /// (`a` slowest), so completion order is the reverse of input order.
    struct FakeStore {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl FakeStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_on: None,
            })
        }
    }

    #[async_trait]
    impl BlobTransport for FakeStore {
        async fn upload(&self, file: &LocalFile) -> Result<Url, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = match file.name.chars().next() {
                Some('a') => 300,
                Some('b') => 200,
                _ => 100,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if self.fail_on == Some(file.name.as_str()) {
                return Err(CoreError::UploadFailed {
                    file: file.name.clone(),
                    message: "blob store rejected the file".into(),
                });
            }
            Ok(Url::parse(&format!("https://cdn.example.com/{}", file.name)).unwrap())
        }
    }

    fn png(name: &str) -> LocalFile {
        LocalFile::new(name, "image/png", Bytes::from_static(b"\x89PNG"))
    }

    fn images() -> AcceptSet {
        AcceptSet::new(["image/*"])
    }

    #[test]
    fn accept_set_matching() {
        let set = AcceptSet::new(["image/*", "video/mp4"]);
        assert!(set.allows("image/png"));
        assert!(set.allows("IMAGE/JPEG"));
        assert!(set.allows("video/mp4; codecs=avc1"));
        assert!(!set.allows("video/webm"));
        assert!(!set.allows("imagepng"));
        assert!(AcceptSet::new(["*/*"]).allows("application/pdf"));
        assert!(!AcceptSet::default().allows("image/png"));
    }

    #[test]
    fn local_file_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poster.JPG");
        std::fs::write(&path, b"jpeg").unwrap();
        let file = LocalFile::from_path(&path).unwrap();
        assert_eq!(file.name, "poster.JPG");
        assert_eq!(file.mime, "image/jpeg");
        assert_eq!(file.size(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn urls_follow_selection_order() {
        let store = FakeStore::new();
        let (pipeline, mut events) = UploadPipeline::new(store.clone(), images());

        let batch = pipeline
            .handle_file_select(vec![png("a.png"), png("b.png"), png("c.png")])
            .unwrap();
        assert_eq!(batch.jobs.len(), 3);

        let event = events.recv().await.unwrap();
        let expected: Vec<Url> = ["a.png", "b.png", "c.png"]
            .iter()
            .map(|n| Url::parse(&format!("https://cdn.example.com/{n}")).unwrap())
            .collect();
        assert_eq!(
            event,
            UploadEvent::Completed {
                batch: batch.id,
                urls: expected.clone(),
            }
        );
        assert!(pipeline.jobs().iter().all(|j| j.status == UploadStatus::Done));

        assert_eq!(pipeline.consume(&batch), Some(expected));
        assert!(pipeline.jobs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn disallowed_type_rejects_selection_without_uploading() {
        let store = FakeStore::new();
        let (pipeline, mut events) = UploadPipeline::new(store.clone(), images());

        let err = pipeline
            .handle_file_select(vec![
                png("a.png"),
                LocalFile::new("trailer.mp4", "video/mp4", Bytes::new()),
            ])
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedMediaType { .. }));
        assert!(matches!(events.recv().await, Some(UploadEvent::Failed { .. })));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert!(pipeline.jobs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_marks_job_failed_without_retry() {
        let store = Arc::new(FakeStore {
            calls: AtomicUsize::new(0),
            fail_on: Some("b.png"),
        });
        let (pipeline, mut events) = UploadPipeline::new(store.clone(), images());

        let batch = pipeline
            .handle_file_select(vec![png("a.png"), png("b.png")])
            .unwrap();
        let event = events.recv().await.unwrap();

        let UploadEvent::Failed { message, .. } = event else {
            panic!("expected failure, got {event:?}");
        };
        assert!(message.contains("blob store rejected the file"));
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);

        let a = pipeline.job(batch.jobs[0]).unwrap();
        let b = pipeline.job(batch.jobs[1]).unwrap();
        assert_eq!(a.status, UploadStatus::Done);
        assert_eq!(b.status, UploadStatus::Failed);
        assert!(b.result_url.is_none());
        assert_eq!(pipeline.consume(&batch), None);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_limit_keeps_extra_jobs_queued() {
        let store = FakeStore::new();
        let (pipeline, _events) = UploadPipeline::with_concurrency(store, images(), 1);

        let batch = pipeline
            .handle_file_select(vec![png("a.png"), png("c.png")])
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(pipeline.job(batch.jobs[0]).unwrap().status, UploadStatus::Uploading);
        assert_eq!(pipeline.job(batch.jobs[1]).unwrap().status, UploadStatus::Queued);
    }

    #[tokio::test(start_paused = true)]
    async fn unmounted_pipeline_stays_silent() {
        let store = FakeStore::new();
        let (pipeline, mut events) = UploadPipeline::new(store.clone(), images());

        pipeline.handle_file_select(vec![png("a.png")]).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        pipeline.unmount();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(pipeline.jobs().is_empty());
        assert!(events.try_recv().is_err());
        assert!(pipeline.handle_file_select(vec![png("b.png")]).is_err());
    }
}
