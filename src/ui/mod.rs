//! Terminal UI components.
//!
//! Draws the list the viewer projects: section headers, one block of lines
//! per row, a loading gauge while icons prefetch, plus title and status bars.

mod overlays;
mod render;
mod status;

pub use render::{render, split_chrome, truncate_to_width};

/// Columns between the selection marker and the icon column.
pub const ROW_LEFT_PADDING: usize = 1;
/// Drawn in the icon column for rows with a prefetched icon.
pub const ICON_GLYPH: &str = "\u{25a3}";

#[cfg(test)]
mod tests;
