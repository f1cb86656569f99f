//! Locating and reading list documents from paths and URLs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use url::Url;

/// Resolve a command-line argument to a document URL.
///
/// `http`, `https` and `file` URLs are taken as-is; anything else is treated
/// as a local path.
///
/// # Errors
/// Returns an error when the path does not exist.
pub fn document_url(arg: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(arg)
        && matches!(url.scheme(), "http" | "https" | "file")
    {
        return Ok(url);
    }
    let path = Path::new(arg);
    let absolute = fs::canonicalize(path)
        .with_context(|| format!("File not found: {}", path.display()))?;
    Url::from_file_path(&absolute)
        .map_err(|()| anyhow!("Not an absolute path: {}", absolute.display()))
}

/// Read and decode the JSON document at `url`.
///
/// # Errors
/// Returns an error when the document cannot be read or is not JSON.
pub fn read_document(url: &Url) -> Result<Value> {
    let _scope = crate::perf::scope("app.read_document");
    let text = match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|()| anyhow!("Invalid file URL {url}"))?;
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
        "http" | "https" => reqwest::blocking::get(url.clone())
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::text)
            .with_context(|| format!("Failed to fetch {url}"))?,
        other => bail!("Unsupported URL scheme: {other}"),
    };
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {url}"))
}

/// Whether `url` names a document the viewer can open in place.
pub fn is_document_link(url: &Url) -> bool {
    matches!(url.scheme(), "file" | "http" | "https")
        && Path::new(url.path())
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("swipe"))
}
