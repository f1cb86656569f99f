//! Error types shared by the document, viewer and prefetch layers.

use thiserror::Error;
use url::Url;

/// Errors that abort loading a document.
///
/// Everything else (unresolvable text, missing icons, failed fetches)
/// degrades to an absent visual element instead of surfacing here.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The document has neither a `sections` nor an `items` list.
    #[error("invalid document: expected a `sections` or `items` list")]
    InvalidDocument,
    /// The document source is not valid JSON.
    #[error("malformed document JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single resource that could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("unsupported url scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("not a local file url")]
    InvalidFileUrl,
    #[error("http client unavailable")]
    ClientUnavailable,
}

/// A failed fetch, reported through prefetch progress.
#[derive(Debug)]
pub struct FetchFailure {
    pub url: Url,
    pub error: FetchError,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.url, self.error)
    }
}
