//! `net.swipe.list` document model.
//!
//! This module handles:
//! - Parsing raw JSON into typed sections and items
//! - Resolving localized text for a language id
//! - Picking a document language from user preferences

mod parser;
mod text;
mod types;

pub use parser::{parse, parse_str};
pub use text::primary_subtag;
pub use types::{
    DEFAULT_LANG_ID, DEFAULT_TEXT_KEY, Document, Item, Language, LocalizedStrings, RowHeight,
    Section, Size, Text,
};

use url::Url;

/// Document type string identifying list documents.
pub const LIST_DOCUMENT_TYPE: &str = "net.swipe.list";

/// Returns true when the raw document declares itself as a list document, or
/// declares no type at all.
pub fn is_list_document(raw: &serde_json::Value) -> bool {
    raw.get("type")
        .and_then(serde_json::Value::as_str)
        .is_none_or(|ty| ty == LIST_DOCUMENT_TYPE)
}

/// Resolve a document URL string against the document's base URL.
///
/// Absolute URLs parse as-is; relative ones are joined onto `base`. Returns
/// `None` for unparsable values or relative values without a base.
pub fn resolve_url(value: &str, base: Option<&Url>) -> Option<Url> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match Url::parse(value) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(value).ok(),
        Err(_) => None,
    }
}

impl Document {
    /// Parse a document from JSON source text.
    ///
    /// # Errors
    /// See [`parse_str`].
    pub fn from_json_str(source: &str) -> Result<Self, crate::error::ViewerError> {
        parse_str(source)
    }

    /// Parse a document from an already decoded JSON value.
    ///
    /// # Errors
    /// See [`parse`].
    pub fn from_value(raw: &serde_json::Value) -> Result<Self, crate::error::ViewerError> {
        parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_is_list_document() {
        assert!(is_list_document(&json!({ "items": [] })));
        assert!(is_list_document(&json!({ "type": "net.swipe.list" })));
        assert!(!is_list_document(&json!({ "type": "net.swipe.swipe" })));
    }

    #[test]
    fn test_resolve_url_absolute_and_relative() {
        let base = Url::parse("http://x/lists/index.json").unwrap();
        assert_eq!(
            resolve_url("http://x/y", Some(&base)).unwrap().as_str(),
            "http://x/y"
        );
        assert_eq!(
            resolve_url("icons/a.png", Some(&base)).unwrap().as_str(),
            "http://x/lists/icons/a.png"
        );
        assert_eq!(
            resolve_url("/root.png", Some(&base)).unwrap().as_str(),
            "http://x/root.png"
        );
    }

    #[test]
    fn test_resolve_url_relative_without_base_fails() {
        assert!(resolve_url("icons/a.png", None).is_none());
        assert!(resolve_url("", None).is_none());
        assert!(resolve_url("http://[bad", None).is_none());
    }

    proptest! {
        #[test]
        fn prop_items_only_preserves_order(titles in proptest::collection::vec("[a-z]{1,8}", 0..20)) {
            let items: Vec<_> = titles.iter().map(|t| json!({ "title": t })).collect();
            let doc = Document::from_value(&json!({ "items": items })).unwrap();
            prop_assert_eq!(doc.sections().len(), 1);
            prop_assert!(doc.sections()[0].title.is_none());
            let parsed: Vec<_> = doc.sections()[0]
                .items
                .iter()
                .map(|item| doc.resolve_field(item.title.as_ref(), DEFAULT_LANG_ID))
                .collect();
            let expected: Vec<_> = titles.into_iter().map(Some).collect();
            prop_assert_eq!(parsed, expected);
        }

        #[test]
        fn prop_documents_without_lists_are_invalid(title in ".*", height in 0u32..1000) {
            let raw = json!({ "title": title, "rowHeight": height });
            prop_assert!(matches!(
                Document::from_value(&raw),
                Err(crate::error::ViewerError::InvalidDocument)
            ));
        }
    }
}
