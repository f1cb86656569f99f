//! Remote resource prefetching.
//!
//! - [`collect`]: gather the icon URLs a document needs
//! - [`Prefetcher`]: the fetch contract viewers depend on
//! - [`FilePrefetcher`]: worker-thread implementation backed by a cache directory
//!
//! Prefetchers never call back into the viewer directly. They send
//! [`PrefetchUpdate`]s over a channel which the owning thread drains, so
//! viewer state is only ever touched by its owner.

mod collector;
mod fetcher;

pub use collector::{ResourceSet, collect};
pub use fetcher::{DEFAULT_WORKERS, FilePrefetcher, cache_file_name};

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use url::Url;

use crate::error::FetchFailure;

/// Cancellation handle for one load.
///
/// Each load gets a fresh generation. Updates carry the generation they were
/// started with, so stale updates can be told apart from current ones even
/// after the flag itself has been dropped.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Progress report from a prefetcher.
#[derive(Debug, Default)]
pub struct PrefetchUpdate {
    /// Generation of the load this update belongs to
    pub generation: u64,
    /// True exactly once per load, when every resource has been attempted
    pub completed: bool,
    /// Resources that are now available locally
    pub fetched: Vec<Url>,
    /// Resources that could not be fetched
    pub failed: Vec<FetchFailure>,
}

/// Fetches remote resources into local storage.
pub trait Prefetcher {
    /// Begin fetching `resources`.
    ///
    /// Updates are sent on `updates`, tagged with `cancel.generation()`. The
    /// final update has `completed` set, including for an empty set.
    /// Implementations must stop starting new fetches once `cancel` fires and
    /// must tolerate the receiver having been dropped.
    fn start(&mut self, resources: &ResourceSet, cancel: CancelToken, updates: Sender<PrefetchUpdate>);

    /// Fraction of the current resource set that has been attempted, in `[0, 1]`.
    fn progress(&self) -> f32;

    /// Local path of a fetched resource, or `None` if it is not available.
    fn map(&self, url: &Url) -> Option<PathBuf>;
}
