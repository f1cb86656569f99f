//! Resource collection.

use std::collections::BTreeMap;

use url::Url;

use crate::document::{Section, resolve_url};

/// Resources to prefetch, keyed by absolute URL.
///
/// The value is a cache prefix tag. List documents never use one, so it is
/// always empty, but the shape matches other viewers' resource sets.
pub type ResourceSet = BTreeMap<Url, String>;

/// Collect the icon URLs used by `sections`, resolved against `base_url`.
///
/// Icons that do not resolve to a valid URL are skipped.
pub fn collect(sections: &[Section], base_url: Option<&Url>) -> ResourceSet {
    let mut urls = ResourceSet::new();
    for item in sections.iter().flat_map(|section| &section.items) {
        let Some(icon) = item.icon.as_deref() else {
            continue;
        };
        match resolve_url(icon, base_url) {
            Some(url) => {
                urls.insert(url, String::new());
            }
            None => tracing::debug!(icon, "skipping unresolvable icon"),
        }
    }
    urls
}
