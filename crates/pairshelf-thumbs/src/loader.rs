//! Async thumbnail loading with request coalescing.
//!
//! A fixed pool of worker tasks drains one bounded queue. Requests for a
//! key already being rendered attach to the in-flight entry instead of
//! queuing a second decode; every waiter gets the same `Arc`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::ThumbnailCache;
use crate::config::ThumbConfig;
use crate::error::ThumbError;
use crate::key::ThumbKey;
use crate::render::{render_file, Thumbnail};

type RenderOutcome = Result<Arc<Thumbnail>, ThumbError>;
type Waiters = Vec<oneshot::Sender<RenderOutcome>>;

/// Outcome of a thumbnail request.
#[derive(Debug)]
pub enum ThumbnailResponse {
    /// Served from the cache, no work queued.
    Ready(Arc<Thumbnail>),
    /// Queued or attached to an in-flight render; resolves through
    /// [`PendingThumbnail::wait`].
    Pending(PendingThumbnail),
}

/// Handle to a render that has not completed yet.
#[derive(Debug)]
pub struct PendingThumbnail {
    path: PathBuf,
    rx: oneshot::Receiver<RenderOutcome>,
}

impl PendingThumbnail {
    fn new(path: PathBuf) -> (oneshot::Sender<RenderOutcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { path, rx })
    }

    /// A pending handle whose outcome is already known. Used when a
    /// request fails before it can be queued.
    fn resolved(path: PathBuf, outcome: RenderOutcome) -> Self {
        let (tx, pending) = Self::new(path);
        let _ = tx.send(outcome);
        pending
    }

    /// The source path this render was requested for.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the render to complete.
    ///
    /// Resolves to [`ThumbError::Canceled`] if the loader shut down
    /// before the render ran.
    pub async fn wait(self) -> RenderOutcome {
        let Self { path, rx } = self;
        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ThumbError::Canceled { path }),
        }
    }
}

/// Thumbnail renderer with a bounded queue, a fixed worker pool, and a
/// shared result cache.
///
/// Spawns its workers on construction, so it must be created inside a
/// tokio runtime. Dropping the loader closes the queue; workers drain
/// what was already accepted and stop.
pub struct ThumbnailLoader {
    cache: Arc<ThumbnailCache>,
    config: Arc<ThumbConfig>,
    queue: mpsc::Sender<ThumbKey>,
    inflight: Arc<DashMap<ThumbKey, Waiters>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThumbnailLoader {
    /// Create a loader and its cache, and start the worker pool.
    pub fn new(config: ThumbConfig) -> Self {
        let cache = Arc::new(ThumbnailCache::new(config.max_entries, config.max_bytes));
        let config = Arc::new(config);
        let inflight: Arc<DashMap<ThumbKey, Waiters>> = Arc::new(DashMap::new());

        let (tx, rx) = mpsc::channel(config.queue_depth);
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..config.workers)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    Arc::clone(&rx),
                    Arc::clone(&cache),
                    Arc::clone(&config),
                    Arc::clone(&inflight),
                ))
            })
            .collect();

        Self {
            cache,
            config,
            queue: tx,
            inflight,
            workers,
        }
    }

    /// The cache this loader fills.
    pub fn cache(&self) -> &Arc<ThumbnailCache> {
        &self.cache
    }

    /// The configuration this loader was built with.
    pub fn config(&self) -> &ThumbConfig {
        &self.config
    }

    /// Request a thumbnail for `path` at the given box size.
    ///
    /// A cached entry is returned as [`ThumbnailResponse::Ready`] without
    /// queuing work. Otherwise the request joins the in-flight render for
    /// its key, or queues a new one; either way the caller gets a
    /// [`PendingThumbnail`] to await. Failures, including a full queue,
    /// resolve through the pending handle rather than returning an error
    /// here.
    pub fn request(&self, path: &Path, width: u32, height: u32) -> ThumbnailResponse {
        let key = match ThumbKey::for_file(path, width, height, &self.config.render) {
            Ok(key) => key,
            Err(err) => {
                return ThumbnailResponse::Pending(PendingThumbnail::resolved(
                    path.to_path_buf(),
                    Err(ThumbError::io(path, err)),
                ));
            }
        };

        if let Some(thumb) = self.cache.get(&key) {
            return ThumbnailResponse::Ready(thumb);
        }

        let (tx, pending) = PendingThumbnail::new(key.path.clone());

        // First waiter for a key owns queuing the job; later waiters
        // attach to the same entry.
        let first = {
            let mut waiters = self.inflight.entry(key.clone()).or_default();
            let first = waiters.is_empty();
            waiters.push(tx);
            first
        };
        if !first {
            debug!(path = %key.path.display(), "coalesced onto in-flight render");
            return ThumbnailResponse::Pending(pending);
        }

        if let Err(err) = self.queue.try_send(key) {
            let (key, outcome) = match err {
                TrySendError::Full(key) => {
                    warn!(path = %key.path.display(), "thumbnail queue full, dropping request");
                    let outcome = Err(ThumbError::QueueFull {
                        path: key.path.clone(),
                    });
                    (key, outcome)
                }
                TrySendError::Closed(key) => {
                    let outcome = Err(ThumbError::Canceled {
                        path: key.path.clone(),
                    });
                    (key, outcome)
                }
            };
            if let Some((_, waiters)) = self.inflight.remove(&key) {
                fan_out(waiters, &outcome);
            }
        }
        ThumbnailResponse::Pending(pending)
    }

    /// Stop accepting requests and wait for already queued work to drain.
    pub async fn shutdown(self) {
        let Self { queue, workers, .. } = self;
        drop(queue);
        for worker in workers {
            let _ = worker.await;
        }
    }
}

/// Deliver one outcome to every coalesced waiter.
fn fan_out(waiters: Waiters, outcome: &RenderOutcome) {
    for waiter in waiters {
        let _ = waiter.send(outcome.clone());
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<ThumbKey>>>,
    cache: Arc<ThumbnailCache>,
    config: Arc<ThumbConfig>,
    inflight: Arc<DashMap<ThumbKey, Waiters>>,
) {
    loop {
        // Hold the receiver only while idle; rendering happens unlocked
        // so the other workers keep draining the queue.
        let key = {
            let mut rx = queue.lock().await;
            match rx.recv().await {
                Some(key) => key,
                None => break,
            }
        };

        let outcome = render_with_timeout(&key, &config).await;
        if let Ok(thumb) = &outcome {
            cache.insert(key.clone(), Arc::clone(thumb));
        }
        // The cache write lands before the waiter entry is removed, so a
        // request arriving now either joins the entry or hits the cache.
        if let Some((_, waiters)) = inflight.remove(&key) {
            fan_out(waiters, &outcome);
        }
    }
    debug!(worker = id, "thumbnail worker stopped");
}

/// Run one decode/resize on the blocking pool under the request budget.
///
/// A timeout frees this worker for the next job; the abandoned blocking
/// render finishes in the background and its result is discarded.
async fn render_with_timeout(key: &ThumbKey, config: &ThumbConfig) -> RenderOutcome {
    let path = key.path.clone();
    let (width, height) = (key.width, key.height);
    let options = config.render.clone();
    let render = tokio::task::spawn_blocking(move || render_file(&path, width, height, &options));

    match tokio::time::timeout(config.timeout, render).await {
        Ok(Ok(outcome)) => outcome.map(Arc::new),
        Ok(Err(join_err)) => {
            warn!(path = %key.path.display(), error = %join_err, "render task failed");
            Err(ThumbError::Canceled {
                path: key.path.clone(),
            })
        }
        Err(_) => {
            warn!(path = %key.path.display(), timeout = ?config.timeout, "render timed out");
            Err(ThumbError::TimedOut {
                path: key.path.clone(),
                timeout: config.timeout,
            })
        }
    }
}
