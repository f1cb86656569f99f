//! Terminal host for list documents.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! The viewer reports navigation through a channel delegate; the event loop
//! drains it after each update and opens linked list documents in place.

mod effects;
mod event_loop;
mod input;
mod model;
pub mod source;
mod update;

pub use model::{
    LineSlot, MAX_ROW_LINES, Model, POINTS_PER_COLUMN, POINTS_PER_LINE, ProgressNote, RowIndex,
    ToastLevel,
};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::prefetch::DEFAULT_WORKERS;

/// Main application struct that owns the terminal and runs the event loop.
#[derive(Debug)]
pub struct App {
    /// Document path or URL as given on the command line
    document: String,
    language_preferences: Vec<String>,
    cache_dir: PathBuf,
    workers: usize,
}

impl App {
    /// Create a new application for the given document path or URL.
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            language_preferences: Vec::new(),
            cache_dir: crate::config::default_cache_dir(),
            workers: DEFAULT_WORKERS,
        }
    }

    /// Set language preferences, most preferred first.
    #[must_use]
    pub fn with_language_preferences(mut self, preferences: Vec<String>) -> Self {
        self.language_preferences = preferences;
        self
    }

    /// Directory prefetched icons are cached in.
    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    /// Number of prefetch worker threads.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}
