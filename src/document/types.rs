//! Core document types.

use serde::Deserialize;

/// Default language id used until a document or the user picks another.
pub const DEFAULT_LANG_ID: &str = "en";

/// Key of the catch-all entry in a localized text map.
pub const DEFAULT_TEXT_KEY: &str = "*";

/// A parsed `net.swipe.list` document.
///
/// Immutable once parsed; viewers keep their own language and prefetch state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub(crate) title: Option<String>,
    pub(crate) sections: Vec<Section>,
    pub(crate) row_height: Option<RowHeight>,
    pub(crate) languages: Option<Vec<Language>>,
    /// Shared localized strings addressed by `{"ref": key}`
    pub(crate) strings: Vec<(String, LocalizedStrings)>,
}

impl Document {
    /// Document title, shown by hosts in their chrome.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Sections in document order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Look up a section by index.
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Look up an item by section and row index.
    pub fn item(&self, section: usize, row: usize) -> Option<&Item> {
        self.sections.get(section)?.items.get(row)
    }

    /// Requested row height, if the document declares one.
    pub const fn row_height(&self) -> Option<RowHeight> {
        self.row_height
    }

    /// Declared languages, if any.
    pub fn languages(&self) -> Option<&[Language]> {
        self.languages.as_deref()
    }

    /// Shared string bundle for a reference key.
    pub fn strings(&self, key: &str) -> Option<&LocalizedStrings> {
        self.strings
            .iter()
            .find_map(|(k, texts)| (k == key).then_some(texts))
    }

    /// Total number of items across all sections.
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

/// A titled group of items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub title: Option<Text>,
    pub items: Vec<Item>,
}

/// One row's worth of data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub title: Option<Text>,
    /// Subtitle
    pub text: Option<Text>,
    /// Icon location, relative to the document base URL
    pub icon: Option<String>,
    /// Navigation target, relative to the document base URL
    pub url: Option<String>,
}

/// A text value that may vary by language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Text {
    /// Plain string used for every language.
    Literal(String),
    /// `{"ref": key}` pointing into the document's `strings` table.
    Reference(String),
    /// `{lang: text, ...}` resolved directly.
    Localized(LocalizedStrings),
}

/// Language-id to text entries in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedStrings {
    entries: Vec<(String, String)>,
}

impl LocalizedStrings {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Pick the text for `lang_id`.
    ///
    /// Falls back to the `"*"` entry, then to the first declared entry.
    pub fn resolve(&self, lang_id: &str) -> Option<&str> {
        self.get(lang_id)
            .or_else(|| self.get(DEFAULT_TEXT_KEY))
            .or_else(|| self.entries.first().map(|(_, text)| text.as_str()))
    }

    pub fn get(&self, lang_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find_map(|(id, text)| (id == lang_id).then_some(text.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A language the document offers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Language {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Row height declared by the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowHeight {
    /// Fixed height in points.
    Absolute(f32),
    /// Percentage of the viewport height.
    Percent(f32),
}

impl RowHeight {
    /// Resolve to an absolute height for a viewport of `viewport_height`.
    pub fn resolve(self, viewport_height: f32) -> f32 {
        match self {
            Self::Absolute(value) => value,
            Self::Percent(percent) => viewport_height * percent / 100.0,
        }
    }
}

/// Size of the area a viewer renders into.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}
