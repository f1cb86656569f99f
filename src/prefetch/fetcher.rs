//! Worker-thread prefetcher backed by a cache directory.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use tempfile::NamedTempFile;
use url::Url;

use super::{CancelToken, PrefetchUpdate, Prefetcher, ResourceSet};
use crate::error::{FetchError, FetchFailure};

/// Number of fetch threads used when none is configured.
pub const DEFAULT_WORKERS: usize = 4;

const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<Url, PathBuf>,
}

#[derive(Debug, Default)]
struct LoadProgress {
    total: usize,
    done: AtomicUsize,
}

impl LoadProgress {
    fn new(total: usize) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        let done = self.done.load(Ordering::Acquire).min(self.total);
        done as f32 / self.total as f32
    }
}

/// Everything a worker thread needs for one load.
struct WorkerContext {
    queue: Arc<Mutex<VecDeque<Url>>>,
    cache: Arc<Mutex<CacheInner>>,
    progress: Arc<LoadProgress>,
    cache_dir: PathBuf,
    client: Option<reqwest::blocking::Client>,
    cancel: CancelToken,
    updates: Sender<PrefetchUpdate>,
}

/// Prefetcher that stores resources as files under a cache directory.
///
/// `file://` resources are copied, `http(s)://` resources downloaded. Files
/// already present in the cache are reused without refetching. Failed
/// resources are reported and never retried.
#[derive(Debug)]
pub struct FilePrefetcher {
    cache_dir: PathBuf,
    workers: usize,
    cache: Arc<Mutex<CacheInner>>,
    progress: Arc<LoadProgress>,
}

impl FilePrefetcher {
    /// Create a prefetcher writing into `cache_dir` with `workers` threads.
    pub fn new(cache_dir: PathBuf, workers: usize) -> Self {
        Self {
            cache_dir,
            workers: workers.max(1),
            cache: Arc::new(Mutex::new(CacheInner::default())),
            progress: Arc::new(LoadProgress::new(0)),
        }
    }

    /// The directory fetched resources are written to.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Number of resources currently mapped to local files.
    pub fn len(&self) -> usize {
        lock(&self.cache).entries.len()
    }

    /// Check if nothing has been fetched yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Prefetcher for FilePrefetcher {
    fn start(&mut self, resources: &ResourceSet, cancel: CancelToken, updates: Sender<PrefetchUpdate>) {
        let generation = cancel.generation();
        let queue: VecDeque<Url> = resources.keys().cloned().collect();
        let total = queue.len();
        self.progress = Arc::new(LoadProgress::new(total));
        crate::perf::log_event(
            "prefetch.start",
            format!("generation={generation} total={total} workers={}", self.workers),
        );

        if total == 0 {
            let _ = updates.send(PrefetchUpdate {
                generation,
                completed: true,
                ..PrefetchUpdate::default()
            });
            return;
        }

        if let Err(err) = fs::create_dir_all(&self.cache_dir) {
            tracing::warn!(dir = %self.cache_dir.display(), %err, "cannot create prefetch cache dir");
        }

        let client = if queue.iter().any(|url| matches!(url.scheme(), "http" | "https")) {
            build_client()
        } else {
            None
        };
        let queue = Arc::new(Mutex::new(queue));

        let mut spawned = 0;
        for index in 0..self.workers.min(total) {
            let ctx = WorkerContext {
                queue: Arc::clone(&queue),
                cache: Arc::clone(&self.cache),
                progress: Arc::clone(&self.progress),
                cache_dir: self.cache_dir.clone(),
                client: client.clone(),
                cancel: cancel.clone(),
                updates: updates.clone(),
            };
            match thread::Builder::new()
                .name(format!("prefetch-{index}"))
                .spawn(move || run_worker(&ctx))
            {
                Ok(_) => spawned += 1,
                Err(err) => tracing::warn!(%err, "failed to spawn prefetch worker"),
            }
        }

        if spawned == 0 {
            // Degrade to fetching on the caller's thread so the load still completes.
            run_worker(&WorkerContext {
                queue,
                cache: Arc::clone(&self.cache),
                progress: Arc::clone(&self.progress),
                cache_dir: self.cache_dir.clone(),
                client,
                cancel,
                updates,
            });
        }
    }

    fn progress(&self) -> f32 {
        self.progress.fraction()
    }

    fn map(&self, url: &Url) -> Option<PathBuf> {
        lock(&self.cache).entries.get(url).cloned()
    }
}

/// Stable cache file name for `url`: a hash of the URL plus its extension.
pub fn cache_file_name(url: &Url) -> String {
    let mut hasher = DefaultHasher::new();
    url.as_str().hash(&mut hasher);
    let hash = hasher.finish();
    let ext = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    match ext {
        Some(ext) => format!("{hash:016x}.{}", ext.to_ascii_lowercase()),
        None => format!("{hash:016x}"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn build_client() -> Option<reqwest::blocking::Client> {
    match reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
    {
        Ok(client) => Some(client),
        Err(err) => {
            tracing::warn!(%err, "http client unavailable, remote resources will fail");
            None
        }
    }
}

fn run_worker(ctx: &WorkerContext) {
    let generation = ctx.cancel.generation();
    loop {
        if ctx.cancel.is_cancelled() {
            crate::perf::log_event("prefetch.cancelled", format!("generation={generation}"));
            break;
        }
        let Some(url) = lock(&ctx.queue).pop_front() else {
            break;
        };

        let mut update = PrefetchUpdate {
            generation,
            ..PrefetchUpdate::default()
        };
        match fetch_one(&url, &ctx.cache_dir, ctx.client.as_ref()) {
            Ok(path) => {
                tracing::debug!(%url, path = %path.display(), "prefetched");
                lock(&ctx.cache).entries.insert(url.clone(), path);
                update.fetched.push(url);
            }
            Err(error) => {
                tracing::warn!(%url, %error, "prefetch failed");
                update.failed.push(FetchFailure { url, error });
            }
        }

        let done = ctx.progress.done.fetch_add(1, Ordering::AcqRel) + 1;
        update.completed = done == ctx.progress.total;
        if ctx.updates.send(update).is_err() {
            // Owner is gone; nothing left to report to.
            break;
        }
    }
}

fn fetch_one(
    url: &Url,
    cache_dir: &Path,
    client: Option<&reqwest::blocking::Client>,
) -> Result<PathBuf, FetchError> {
    let path = cache_dir.join(cache_file_name(url));
    if path.is_file() {
        return Ok(path);
    }

    let bytes = match url.scheme() {
        "file" => {
            let source = url.to_file_path().map_err(|()| FetchError::InvalidFileUrl)?;
            fs::read(source)?
        }
        "http" | "https" => {
            let client = client.ok_or(FetchError::ClientUnavailable)?;
            let response = client.get(url.clone()).send()?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }
            response.bytes()?.to_vec()
        }
        other => return Err(FetchError::UnsupportedScheme(other.to_string())),
    };

    // One temp file per write; concurrent writers of a URL must not share it.
    let mut partial = NamedTempFile::new_in(cache_dir)?;
    partial.write_all(&bytes)?;
    partial.persist(&path).map_err(|err| err.error)?;
    Ok(path)
}
