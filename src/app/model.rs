use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde_json::Value;
use url::Url;

use crate::document::Size;
use crate::error::ViewerError;
use crate::viewer::{DocumentViewer, ListViewer, ProjectionState, RowStyle};

/// Points per terminal line when mapping document row heights to the terminal.
pub const POINTS_PER_LINE: f32 = 22.0;
/// Points per terminal column.
pub const POINTS_PER_COLUMN: f32 = 10.0;
/// Rows never grow beyond this many terminal lines.
pub const MAX_ROW_LINES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Position of a row in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowIndex {
    pub section: usize,
    pub row: usize,
}

/// One terminal line of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSlot {
    /// Section header line.
    Header(usize),
    /// `line`-th terminal line of a row.
    Row { index: RowIndex, line: usize },
}

/// Progress reported by the viewer since the last drain.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressNote {
    pub progress: f32,
    pub failure: Option<String>,
}

/// The complete application state.
pub struct Model {
    /// Viewer for the current document
    pub viewer: ListViewer,
    /// Location of the current document
    pub document_url: Option<Url>,
    /// Previously viewed documents, most recent last
    pub history: Vec<Url>,
    /// Selected row
    pub selected: Option<RowIndex>,
    /// First visible list line
    pub scroll_offset: usize,
    /// Terminal size (columns, rows)
    pub terminal_size: (u16, u16),
    /// Whether the title and status bars are shown
    pub chrome_visible: bool,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// Whether the app should quit
    pub should_quit: bool,
    toast: Option<Toast>,
    progress_notes: Rc<RefCell<Vec<ProgressNote>>>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("document_url", &self.document_url)
            .field("selected", &self.selected)
            .field("scroll_offset", &self.scroll_offset)
            .field("terminal_size", &self.terminal_size)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a model around `viewer` for a terminal of `terminal_size`.
    pub fn new(viewer: ListViewer, terminal_size: (u16, u16)) -> Self {
        Self {
            viewer,
            document_url: None,
            history: Vec::new(),
            selected: None,
            scroll_offset: 0,
            terminal_size,
            chrome_visible: true,
            help_visible: false,
            should_quit: false,
            toast: None,
            progress_notes: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Load `raw` as the current document, located at `url`.
    ///
    /// # Errors
    /// Returns the viewer's error when the document is not a valid list.
    pub fn load_document(&mut self, url: Url, raw: &Value) -> Result<(), ViewerError> {
        let notes = Rc::clone(&self.progress_notes);
        self.viewer.load_document(
            raw,
            self.viewport_size(),
            Some(url.clone()),
            None,
            Box::new(move |progress, failure| {
                notes.borrow_mut().push(ProgressNote {
                    progress,
                    failure: failure.map(ToString::to_string),
                });
            }),
        )?;
        self.progress_notes.borrow_mut().clear();
        self.document_url = Some(url);
        self.selected = None;
        self.scroll_offset = 0;
        Ok(())
    }

    /// Take progress notes reported since the last call.
    pub fn drain_progress_notes(&mut self) -> Vec<ProgressNote> {
        std::mem::take(&mut *self.progress_notes.borrow_mut())
    }

    /// Height of the list area in terminal lines (minus title and status bars).
    pub const fn list_height(&self) -> usize {
        if self.chrome_visible {
            self.terminal_size.1.saturating_sub(2) as usize
        } else {
            self.terminal_size.1 as usize
        }
    }

    /// Show or hide the title and status bars, re-laying out the list.
    pub fn toggle_chrome(&mut self) {
        self.chrome_visible = !self.chrome_visible;
        let size = self.viewport_size();
        self.viewer.layout(size);
        self.ensure_selection_visible();
    }

    /// The list area expressed in document points.
    #[allow(clippy::cast_precision_loss)]
    pub fn viewport_size(&self) -> Size {
        Size::new(
            f32::from(self.terminal_size.0) * POINTS_PER_COLUMN,
            self.list_height() as f32 * POINTS_PER_LINE,
        )
    }

    /// Terminal lines used by a row of `style`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn row_lines(&self, style: RowStyle) -> usize {
        let min = match style {
            RowStyle::Simple => 1,
            RowStyle::Detailed => 2,
        };
        let lines = (self.viewer.row_height() / POINTS_PER_LINE).round().max(0.0) as usize;
        lines.clamp(min, MAX_ROW_LINES.max(min))
    }

    /// Every row in display order.
    pub fn row_order(&self) -> Vec<RowIndex> {
        (0..self.viewer.section_count())
            .flat_map(|section| {
                (0..self.viewer.row_count(section)).map(move |row| RowIndex { section, row })
            })
            .collect()
    }

    /// Every terminal line of the list in display order.
    pub fn line_layout(&self) -> Vec<LineSlot> {
        let mut slots = Vec::new();
        for section in 0..self.viewer.section_count() {
            if self.viewer.section_title(section).is_some() {
                slots.push(LineSlot::Header(section));
            }
            for row in 0..self.viewer.row_count(section) {
                let style = self.viewer.row(section, row).style;
                let index = RowIndex { section, row };
                slots.extend((0..self.row_lines(style)).map(|line| LineSlot::Row { index, line }));
            }
        }
        slots
    }

    pub fn is_loading(&self) -> bool {
        self.viewer.state() == Some(ProjectionState::Loading)
    }

    /// Move the selection by `delta` rows, clamping at both ends.
    pub fn move_selection(&mut self, delta: isize) {
        let order = self.row_order();
        if order.is_empty() {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .and_then(|sel| order.iter().position(|idx| *idx == sel));
        let next = match current {
            Some(pos) => pos.saturating_add_signed(delta).min(order.len() - 1),
            None => 0,
        };
        self.selected = Some(order[next]);
        self.ensure_selection_visible();
    }

    pub fn select_first(&mut self) {
        self.selected = self.row_order().first().copied();
        self.ensure_selection_visible();
    }

    pub fn select_last(&mut self) {
        self.selected = self.row_order().last().copied();
        self.ensure_selection_visible();
    }

    /// Keep the selection valid for the current list, selecting the first row
    /// when nothing valid is selected.
    pub fn normalize_selection(&mut self) {
        let order = self.row_order();
        if !self.selected.is_some_and(|sel| order.contains(&sel)) {
            self.selected = order.first().copied();
        }
        self.ensure_selection_visible();
    }

    /// Scroll so the whole selected row (and its section header for the
    /// first row) is on screen.
    pub fn ensure_selection_visible(&mut self) {
        let height = self.list_height().max(1);
        let slots = self.line_layout();
        let max_offset = slots.len().saturating_sub(height);
        let Some(selected) = self.selected else {
            self.scroll_offset = self.scroll_offset.min(max_offset);
            return;
        };
        let lines: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, LineSlot::Row { index, .. } if *index == selected))
            .map(|(i, _)| i)
            .collect();
        let (Some(&first), Some(&last)) = (lines.first(), lines.last()) else {
            return;
        };
        let first = if first > 0 && slots[first - 1] == LineSlot::Header(selected.section) {
            first - 1
        } else {
            first
        };
        if first < self.scroll_offset {
            self.scroll_offset = first;
        } else if last >= self.scroll_offset + height {
            self.scroll_offset = last + 1 - height;
        }
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    /// Switch to the next language the document declares.
    pub fn cycle_language(&mut self) {
        let Some(languages) = self.viewer.languages() else {
            self.show_toast(ToastLevel::Info, "Document has no languages");
            return;
        };
        if languages.is_empty() {
            self.show_toast(ToastLevel::Info, "Document has no languages");
            return;
        }
        let current = languages
            .iter()
            .position(|lang| lang.id == self.viewer.lang_id());
        let next = current.map_or(0, |pos| (pos + 1) % languages.len());
        let lang = languages[next].clone();
        self.viewer.reload_with_language_id(&lang.id);
        self.show_toast(
            ToastLevel::Info,
            format!("Language: {}", lang.title.as_deref().unwrap_or(&lang.id)),
        );
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}
