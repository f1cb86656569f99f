// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. viewer::ViewerEvent)
    clippy::module_name_repetitions
)]

//! # Swipe List
//!
//! A viewer for `net.swipe.list` table documents.
//!
//! A list document is JSON: sections of items, each with a localizable title
//! and subtitle, an optional icon and an optional link. The viewer:
//! - Parses the document leniently into a typed model
//! - Prefetches every icon before showing rows
//! - Resolves localized text for the chosen language
//! - Routes row activations to a delegate as absolute URLs
//!
//! ## Modules
//!
//! - [`document`]: Document model, parsing and localization
//! - [`prefetch`]: Icon collection and background fetching
//! - [`viewer`]: List projection, row routing and the viewer surface
//! - [`app`]: Terminal host built on The Elm Architecture
//! - [`ui`]: Terminal rendering
//! - [`config`]: Saved command-line defaults
//! - [`perf`]: Timing scopes and the event log

pub mod app;
pub mod config;
pub mod document;
pub mod error;
pub mod perf;
pub mod prefetch;
pub mod ui;
pub mod viewer;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::document::Document;
    pub use crate::error::{FetchError, FetchFailure, ViewerError};
    pub use crate::prefetch::{FilePrefetcher, Prefetcher};
    pub use crate::viewer::{DocumentViewer, ListViewer, ViewerDelegate};
}
