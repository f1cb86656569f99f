//! Raw JSON to typed document conversion.
//!
//! The raw format is an attribute bag: any field may be missing or carry an
//! unexpected type. Parsing is lenient everywhere except the one structural
//! requirement, a `sections` or `items` list.

use serde_json::{Map, Value};

use super::types::{Document, Item, Language, LocalizedStrings, RowHeight, Section, Text};
use crate::error::ViewerError;

/// Parse a document from a JSON value.
///
/// # Errors
/// Returns [`ViewerError::InvalidDocument`] when the root is not an object or
/// has neither a `sections` nor an `items` list.
pub fn parse(raw: &Value) -> Result<Document, ViewerError> {
    let _scope = crate::perf::scope("document.parse");
    let Some(root) = raw.as_object() else {
        return Err(ViewerError::InvalidDocument);
    };

    let sections = if let Some(sections) = root.get("sections").and_then(Value::as_array) {
        sections
            .iter()
            .filter_map(Value::as_object)
            .map(parse_section)
            .collect()
    } else if let Some(items) = root.get("items").and_then(Value::as_array) {
        vec![Section {
            title: None,
            items: parse_items(items),
        }]
    } else {
        return Err(ViewerError::InvalidDocument);
    };

    let strings = root
        .get("strings")
        .and_then(Value::as_object)
        .map(|strings| {
            strings
                .iter()
                .filter_map(|(key, value)| {
                    value
                        .as_object()
                        .map(|texts| (key.clone(), parse_localized(texts)))
                })
                .collect()
        })
        .unwrap_or_default();

    let document = Document {
        title: root.get("title").and_then(Value::as_str).map(str::to_owned),
        sections,
        row_height: root.get("rowHeight").and_then(parse_row_height),
        languages: root
            .get("languages")
            .and_then(Value::as_array)
            .map(|langs| parse_languages(langs)),
        strings,
    };
    tracing::debug!(
        sections = document.sections.len(),
        items = document.item_count(),
        "parsed list document"
    );
    Ok(document)
}

/// Parse a document from JSON source text.
///
/// # Errors
/// Returns [`ViewerError::Json`] for malformed JSON and
/// [`ViewerError::InvalidDocument`] for a structurally invalid document.
pub fn parse_str(source: &str) -> Result<Document, ViewerError> {
    let raw: Value = serde_json::from_str(source)?;
    parse(&raw)
}

fn parse_section(section: &Map<String, Value>) -> Section {
    Section {
        title: section.get("title").and_then(parse_text),
        items: section
            .get("items")
            .and_then(Value::as_array)
            .map(|items| parse_items(items))
            .unwrap_or_default(),
    }
}

fn parse_items(items: &[Value]) -> Vec<Item> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| Item {
            title: item.get("title").and_then(parse_text),
            text: item.get("text").and_then(parse_text),
            icon: item.get("icon").and_then(Value::as_str).map(str::to_owned),
            url: item.get("url").and_then(Value::as_str).map(str::to_owned),
        })
        .collect()
}

/// Parse a text field. Values that are neither strings nor objects are absent.
pub(crate) fn parse_text(value: &Value) -> Option<Text> {
    match value {
        Value::String(text) => Some(Text::Literal(text.clone())),
        Value::Object(params) => {
            if let Some(key) = params.get("ref").and_then(Value::as_str) {
                Some(Text::Reference(key.to_owned()))
            } else {
                Some(Text::Localized(parse_localized(params)))
            }
        }
        _ => None,
    }
}

fn parse_localized(texts: &Map<String, Value>) -> LocalizedStrings {
    LocalizedStrings::new(
        texts
            .iter()
            .filter_map(|(lang, text)| text.as_str().map(|t| (lang.clone(), t.to_owned())))
            .collect(),
    )
}

fn parse_row_height(value: &Value) -> Option<RowHeight> {
    match value {
        #[allow(clippy::cast_possible_truncation)]
        Value::Number(n) => n.as_f64().map(|v| RowHeight::Absolute(v as f32)),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Some(percent) = trimmed.strip_suffix('%') {
                percent.trim().parse::<f32>().ok().map(RowHeight::Percent)
            } else {
                trimmed.parse::<f32>().ok().map(RowHeight::Absolute)
            }
        }
        _ => None,
    }
}

fn parse_languages(langs: &[Value]) -> Vec<Language> {
    langs
        .iter()
        .filter_map(|lang| serde_json::from_value::<Language>(lang.clone()).ok())
        .collect()
}
