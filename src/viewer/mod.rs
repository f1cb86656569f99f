//! List document viewer.
//!
//! [`ListViewer`] ties the pieces together:
//! - parses the document and picks a language
//! - starts the prefetcher and gates rows on its completion
//! - answers row/section queries from the host's list widget
//! - routes row activations to a [`ViewerDelegate`]
//!
//! All methods run on the owner's thread. Prefetch progress is pulled in by
//! [`ListViewer::poll_prefetch`], which the host calls from its event loop.

mod projection;
mod router;

pub use projection::{ListProjection, ProjectionState, RenderRow, RowStyle, SectionSnapshot};
pub use router::NavigationRequest;

use std::sync::mpsc::{self, Receiver, Sender};

use serde_json::Value;
use url::Url;

use crate::document::{DEFAULT_LANG_ID, Document, Language, Size};
use crate::error::{FetchFailure, ViewerError};
use crate::prefetch::{CancelToken, PrefetchUpdate, Prefetcher, ResourceSet};

/// Row height used until a document declares one.
pub const DEFAULT_ROW_HEIGHT: f32 = 44.0;

/// Opaque viewer state a host may persist between sessions.
pub type ViewerState = serde_json::Map<String, Value>;

/// Receives load progress and non-fatal fetch failures.
pub type ProgressCallback = Box<dyn FnMut(f32, Option<&FetchFailure>)>;

/// Receives navigation and tap events from a viewer.
pub trait ViewerDelegate {
    fn browse_to(&mut self, url: &Url);
    fn tapped(&mut self);
}

/// Events forwarded by [`ChannelDelegate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    BrowseTo(Url),
    Tapped,
}

/// Delegate that forwards events over a channel.
///
/// Lets a host handle navigation after the viewer call that produced it
/// returns, instead of re-entering itself from inside the viewer.
#[derive(Debug, Clone)]
pub struct ChannelDelegate {
    tx: Sender<ViewerEvent>,
}

impl ChannelDelegate {
    pub fn channel() -> (Self, Receiver<ViewerEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl ViewerDelegate for ChannelDelegate {
    fn browse_to(&mut self, url: &Url) {
        let _ = self.tx.send(ViewerEvent::BrowseTo(url.clone()));
    }

    fn tapped(&mut self) {
        let _ = self.tx.send(ViewerEvent::Tapped);
    }
}

/// The capability surface every document viewer offers its host.
pub trait DocumentViewer {
    /// Load `raw`, replacing whatever was loaded before.
    ///
    /// # Errors
    /// Returns [`ViewerError::InvalidDocument`] when the document has neither
    /// `sections` nor `items`. Fetch failures are reported through
    /// `on_progress` and never fail the load.
    fn load_document(
        &mut self,
        raw: &Value,
        size: Size,
        base_url: Option<Url>,
        state: Option<&ViewerState>,
        on_progress: ProgressCallback,
    ) -> Result<(), ViewerError>;
    fn document_title(&self) -> Option<&str>;
    fn set_delegate(&mut self, delegate: Box<dyn ViewerDelegate>);
    fn hide_ui(&self) -> bool;
    fn landscape(&self) -> bool;
    fn become_zombie(&mut self);
    fn save_state(&self) -> Option<ViewerState>;
    fn languages(&self) -> Option<&[Language]>;
    fn reload_with_language_id(&mut self, lang_id: &str);
    fn move_to_page_at(&mut self, index: usize);
    fn page_index(&self) -> Option<usize>;
    fn page_count(&self) -> Option<usize>;
    fn tapped(&mut self);
}

struct LoadedList {
    projection: ListProjection,
    cancel: CancelToken,
    updates: Receiver<PrefetchUpdate>,
    on_progress: ProgressCallback,
}

/// Viewer for `net.swipe.list` documents.
pub struct ListViewer {
    prefetcher: Box<dyn Prefetcher>,
    delegate: Option<Box<dyn ViewerDelegate>>,
    /// User language preferences, most preferred first
    language_preferences: Vec<String>,
    lang_id: String,
    row_height: f32,
    loaded: Option<LoadedList>,
    generation: u64,
    reload_pending: bool,
}

impl std::fmt::Debug for ListViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListViewer")
            .field("lang_id", &self.lang_id)
            .field("row_height", &self.row_height)
            .field("generation", &self.generation)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ListViewer {
    pub fn new(prefetcher: Box<dyn Prefetcher>) -> Self {
        Self {
            prefetcher,
            delegate: None,
            language_preferences: Vec::new(),
            lang_id: DEFAULT_LANG_ID.to_string(),
            row_height: DEFAULT_ROW_HEIGHT,
            loaded: None,
            generation: 0,
            reload_pending: false,
        }
    }

    /// Set the user's language preferences used to pick a document language.
    #[must_use]
    pub fn with_language_preferences(mut self, preferences: Vec<String>) -> Self {
        self.language_preferences = preferences;
        self
    }

    /// Current prefetch state, or `None` when nothing is loaded.
    pub fn state(&self) -> Option<ProjectionState> {
        self.loaded.as_ref().map(|loaded| loaded.projection.state())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn lang_id(&self) -> &str {
        &self.lang_id
    }

    /// Row height resolved for the last laid out size.
    pub const fn row_height(&self) -> f32 {
        self.row_height
    }

    /// Fraction of the current load's resources that have been fetched.
    pub fn progress(&self) -> f32 {
        self.prefetcher.progress()
    }

    pub fn document(&self) -> Option<&Document> {
        self.loaded.as_ref().map(|loaded| loaded.projection.document())
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.loaded
            .as_ref()
            .and_then(|loaded| loaded.projection.base_url())
    }

    /// Icon URLs the current document prefetches.
    pub fn resources(&self) -> Option<&ResourceSet> {
        self.loaded
            .as_ref()
            .map(|loaded| loaded.projection.resources())
    }

    /// Recompute the row height for a new viewport size.
    pub fn layout(&mut self, size: Size) {
        let Some(loaded) = &self.loaded else {
            return;
        };
        if let Some(height) = loaded.projection.document().row_height() {
            self.row_height = height.resolve(size.height);
        }
    }

    /// Apply prefetch updates that have arrived since the last poll.
    ///
    /// Returns the number of updates applied. Updates from superseded or
    /// cancelled loads are dropped.
    pub fn poll_prefetch(&mut self) -> usize {
        let Self {
            loaded,
            prefetcher,
            reload_pending,
            ..
        } = self;
        let Some(loaded) = loaded.as_mut() else {
            return 0;
        };

        let mut applied = 0;
        while let Ok(update) = loaded.updates.try_recv() {
            if update.generation != loaded.cancel.generation() || loaded.cancel.is_cancelled() {
                tracing::debug!(generation = update.generation, "dropping stale prefetch update");
                continue;
            }
            applied += 1;
            if update.completed {
                if loaded.projection.mark_ready() {
                    tracing::info!(
                        generation = update.generation,
                        resources = loaded.projection.resources().len(),
                        "prefetch complete"
                    );
                }
                *reload_pending = true;
            }
            let progress = prefetcher.progress();
            crate::perf::log_event(
                "prefetch.update",
                format!(
                    "generation={} progress={progress:.2} fetched={} failed={} completed={}",
                    update.generation,
                    update.fetched.len(),
                    update.failed.len(),
                    update.completed
                ),
            );
            if update.failed.is_empty() {
                (loaded.on_progress)(progress, None);
            } else {
                for failure in &update.failed {
                    (loaded.on_progress)(progress, Some(failure));
                }
            }
        }
        applied
    }

    /// Returns true once after something happened that requires the host
    /// to reload its list widget.
    pub fn take_reload(&mut self) -> bool {
        std::mem::take(&mut self.reload_pending)
    }

    /// Cancel any running prefetch and drop the loaded document.
    ///
    /// Later prefetch updates are ignored and the progress callback is not
    /// called again.
    pub fn discard(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            loaded.cancel.cancel();
            tracing::debug!(generation = loaded.cancel.generation(), "discarded list document");
        }
        self.reload_pending = false;
    }

    pub fn section_count(&self) -> usize {
        self.loaded
            .as_ref()
            .map_or(0, |loaded| loaded.projection.section_count())
    }

    pub fn row_count(&self, section: usize) -> usize {
        self.loaded
            .as_ref()
            .map_or(0, |loaded| loaded.projection.row_count(section))
    }

    pub fn section_title(&self, section: usize) -> Option<String> {
        self.loaded.as_ref()?.projection.section_title(section)
    }

    pub fn row(&self, section: usize, row: usize) -> RenderRow {
        self.loaded.as_ref().map_or_else(RenderRow::empty, |loaded| {
            loaded.projection.row(section, row, self.prefetcher.as_ref())
        })
    }

    /// Visible sections with all their rows.
    pub fn snapshot(&self) -> Vec<SectionSnapshot> {
        self.loaded.as_ref().map_or_else(Vec::new, |loaded| {
            loaded.projection.snapshot(self.prefetcher.as_ref())
        })
    }

    /// Handle a row selection.
    ///
    /// Forwards the resolved URL to the delegate when the item has one.
    pub fn on_row_activated(&mut self, section: usize, row: usize) -> Option<NavigationRequest> {
        let request = self
            .loaded
            .as_ref()?
            .projection
            .navigation_request(section, row)?;
        tracing::info!(url = %request.url, section, row, "row activated");
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.browse_to(&request.url);
        }
        Some(request)
    }
}

impl DocumentViewer for ListViewer {
    fn load_document(
        &mut self,
        raw: &Value,
        size: Size,
        base_url: Option<Url>,
        _state: Option<&ViewerState>,
        on_progress: ProgressCallback,
    ) -> Result<(), ViewerError> {
        let document = Document::from_value(raw)?;
        self.discard();

        if let Some(lang_id) = document.preferred_language(&self.language_preferences) {
            self.lang_id = lang_id.to_string();
        }

        self.generation += 1;
        let cancel = CancelToken::new(self.generation);
        let (tx, rx) = mpsc::channel();
        let projection = ListProjection::new(document, base_url, self.lang_id.clone());
        tracing::info!(
            generation = self.generation,
            title = projection.document().title().unwrap_or_default(),
            lang = %self.lang_id,
            resources = projection.resources().len(),
            "loading list document"
        );
        self.prefetcher.start(projection.resources(), cancel.clone(), tx);
        self.loaded = Some(LoadedList {
            projection,
            cancel,
            updates: rx,
            on_progress,
        });
        self.row_height = DEFAULT_ROW_HEIGHT;
        self.layout(size);
        Ok(())
    }

    fn document_title(&self) -> Option<&str> {
        self.document()?.title()
    }

    fn set_delegate(&mut self, delegate: Box<dyn ViewerDelegate>) {
        self.delegate = Some(delegate);
    }

    fn hide_ui(&self) -> bool {
        false
    }

    fn landscape(&self) -> bool {
        false
    }

    fn become_zombie(&mut self) {}

    fn save_state(&self) -> Option<ViewerState> {
        None
    }

    fn languages(&self) -> Option<&[Language]> {
        self.document()?.languages()
    }

    fn reload_with_language_id(&mut self, lang_id: &str) {
        self.lang_id = lang_id.to_string();
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.projection.set_lang_id(lang_id);
            self.reload_pending = true;
        }
    }

    fn move_to_page_at(&mut self, _index: usize) {}

    fn page_index(&self) -> Option<usize> {
        None
    }

    fn page_count(&self) -> Option<usize> {
        None
    }

    fn tapped(&mut self) {
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.tapped();
        }
    }
}

impl Drop for ListViewer {
    fn drop(&mut self) {
        self.discard();
    }
}

#[cfg(test)]
mod tests;
