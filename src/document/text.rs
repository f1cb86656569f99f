//! Localized text resolution.

use super::types::{Document, Text};

impl Document {
    /// Resolve a text value for `lang_id`.
    ///
    /// Literals pass through. References look up the document's `strings`
    /// table first and resolve the bundle found there. Returns `None` when a
    /// reference is dangling or the bundle has no entries.
    pub fn resolve_text(&self, text: &Text, lang_id: &str) -> Option<String> {
        match text {
            Text::Literal(literal) => Some(literal.clone()),
            Text::Reference(key) => self
                .strings(key)
                .and_then(|texts| texts.resolve(lang_id))
                .map(str::to_owned),
            Text::Localized(texts) => texts.resolve(lang_id).map(str::to_owned),
        }
    }

    /// Resolve an optional text field, the common case for item and section fields.
    pub fn resolve_field(&self, text: Option<&Text>, lang_id: &str) -> Option<String> {
        text.and_then(|text| self.resolve_text(text, lang_id))
    }

    /// Pick the document language that best matches the user's preferences.
    ///
    /// `preferences` is ordered most preferred first. A preference matches a
    /// declared id exactly, or by its primary subtag (`fr-CA` matches `fr`).
    pub fn preferred_language<S: AsRef<str>>(&self, preferences: &[S]) -> Option<&str> {
        let languages = self.languages()?;
        preferences.iter().find_map(|pref| {
            let pref = pref.as_ref();
            languages
                .iter()
                .find(|lang| lang.id.eq_ignore_ascii_case(pref))
                .or_else(|| {
                    let primary = primary_subtag(pref);
                    languages
                        .iter()
                        .find(|lang| lang.id.eq_ignore_ascii_case(primary))
                })
                .map(|lang| lang.id.as_str())
        })
    }
}

/// Primary language subtag of a tag like `fr-CA`, `pt_BR` or `en_US.UTF-8`.
pub fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_', '.', '@']).next().unwrap_or(tag)
}
