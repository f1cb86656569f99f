//! Rows and section headers computed from a loaded document.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use url::Url;

use crate::document::{Document, Section, resolve_url};
use crate::prefetch::{Prefetcher, ResourceSet, collect};

/// Whether the projection exposes its rows yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionState {
    /// Prefetch is running; no sections are exposed.
    Loading,
    /// Prefetch finished; every section is exposed.
    Ready,
}

/// Visual variant of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStyle {
    /// Title only.
    Simple,
    /// Title with a subtitle line.
    Detailed,
}

/// Everything a host needs to draw one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderRow {
    pub style: RowStyle,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// Local path of the prefetched icon image
    pub icon: Option<PathBuf>,
}

impl RenderRow {
    /// Row drawn for indices that do not exist.
    pub const fn empty() -> Self {
        Self {
            style: RowStyle::Simple,
            title: None,
            subtitle: None,
            icon: None,
        }
    }
}

/// Serializable view of every visible section, used for dumps and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSnapshot {
    pub title: Option<String>,
    pub rows: Vec<RenderRow>,
}

/// A loaded document plus the mutable state needed to render it.
///
/// Only the language id and the prefetch state ever change.
#[derive(Debug)]
pub struct ListProjection {
    pub(super) document: Document,
    pub(super) base_url: Option<Url>,
    lang_id: String,
    state: ProjectionState,
    resources: OnceCell<ResourceSet>,
    /// Whether a local icon file decodes as an image
    icon_checks: RefCell<HashMap<PathBuf, bool>>,
}

impl ListProjection {
    pub fn new(document: Document, base_url: Option<Url>, lang_id: impl Into<String>) -> Self {
        Self {
            document,
            base_url,
            lang_id: lang_id.into(),
            state: ProjectionState::Loading,
            resources: OnceCell::new(),
            icon_checks: RefCell::new(HashMap::new()),
        }
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub const fn state(&self) -> ProjectionState {
        self.state
    }

    pub fn lang_id(&self) -> &str {
        &self.lang_id
    }

    pub fn set_lang_id(&mut self, lang_id: impl Into<String>) {
        self.lang_id = lang_id.into();
    }

    /// Flip to [`ProjectionState::Ready`]. Returns true on the first call only.
    pub fn mark_ready(&mut self) -> bool {
        let changed = self.state == ProjectionState::Loading;
        self.state = ProjectionState::Ready;
        changed
    }

    /// Icon URLs this document needs, computed on first use.
    pub fn resources(&self) -> &ResourceSet {
        self.resources
            .get_or_init(|| collect(self.document.sections(), self.base_url.as_ref()))
    }

    /// Number of sections to show. Zero while loading.
    pub fn section_count(&self) -> usize {
        match self.state {
            ProjectionState::Loading => 0,
            ProjectionState::Ready => self.document.sections().len(),
        }
    }

    /// Number of rows in `section`; zero for unknown sections and while loading.
    pub fn row_count(&self, section: usize) -> usize {
        self.visible_section(section)
            .map_or(0, |section| section.items.len())
    }

    /// Header text for `section`, if it has one that resolves.
    pub fn section_title(&self, section: usize) -> Option<String> {
        let section = self.visible_section(section)?;
        self.document
            .resolve_field(section.title.as_ref(), &self.lang_id)
    }

    fn visible_section(&self, section: usize) -> Option<&Section> {
        match self.state {
            ProjectionState::Loading => None,
            ProjectionState::Ready => self.document.section(section),
        }
    }

    /// Compute the row at `section`/`row`.
    ///
    /// Empty while loading. The title falls back to the raw `url` string. The icon is only set when
    /// the prefetcher has a local copy that decodes as an image.
    pub fn row(&self, section: usize, row: usize, prefetcher: &dyn Prefetcher) -> RenderRow {
        let Some(item) = self
            .visible_section(section)
            .and_then(|section| section.items.get(row))
        else {
            return RenderRow::empty();
        };
        let subtitle = self.document.resolve_field(item.text.as_ref(), &self.lang_id);
        let title = self
            .document
            .resolve_field(item.title.as_ref(), &self.lang_id)
            .or_else(|| item.url.clone());
        let icon = item
            .icon
            .as_deref()
            .and_then(|icon| resolve_url(icon, self.base_url.as_ref()))
            .and_then(|url| prefetcher.map(&url))
            .filter(|path| self.icon_decodes(path));

        RenderRow {
            style: if subtitle.is_some() {
                RowStyle::Detailed
            } else {
                RowStyle::Simple
            },
            title,
            subtitle,
            icon,
        }
    }

    /// Every visible section with its rows.
    pub fn snapshot(&self, prefetcher: &dyn Prefetcher) -> Vec<SectionSnapshot> {
        (0..self.section_count())
            .map(|section| SectionSnapshot {
                title: self.section_title(section),
                rows: (0..self.row_count(section))
                    .map(|row| self.row(section, row, prefetcher))
                    .collect(),
            })
            .collect()
    }

    fn icon_decodes(&self, path: &Path) -> bool {
        if let Some(ok) = self.icon_checks.borrow().get(path) {
            return *ok;
        }
        let ok = image::image_dimensions(path).is_ok();
        if !ok {
            tracing::debug!(path = %path.display(), "icon is not a decodable image");
        }
        self.icon_checks.borrow_mut().insert(path.to_path_buf(), ok);
        ok
    }
}
