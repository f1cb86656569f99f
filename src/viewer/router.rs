//! Row activation to navigation.

use url::Url;

use super::projection::ListProjection;
use crate::document::resolve_url;

/// A request to navigate to another document or resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub url: Url,
}

impl ListProjection {
    /// Navigation target of the item at `section`/`row`, if it has a URL that
    /// resolves against the document base.
    pub fn navigation_request(&self, section: usize, row: usize) -> Option<NavigationRequest> {
        let item = self.document.item(section, row)?;
        let url = resolve_url(item.url.as_deref()?, self.base_url.as_ref())?;
        Some(NavigationRequest { url })
    }
}
