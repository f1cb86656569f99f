use crate::app::Model;
use crate::app::model::ToastLevel;
use crate::viewer::DocumentViewer;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Navigation
    /// Select the next row
    SelectNext,
    /// Select the previous row
    SelectPrev,
    /// Move the selection down one page
    PageDown,
    /// Move the selection up one page
    PageUp,
    /// Select the first row
    SelectFirst,
    /// Select the last row
    SelectLast,
    /// Select a row by its position in display order
    SelectRow(usize),

    // Viewer
    /// Open the selected row's link
    Activate,
    /// Go back to the previous document
    Back,
    /// Switch to the next document language
    CycleLanguage,
    /// Forward a tap to the viewer
    Tap,
    /// The viewer asked for its rows to be reloaded
    ListReloaded,
    /// Reload the current document from its source
    ForceReload,

    /// Toggle help overlay
    ToggleHelp,
    /// Hide help overlay
    HideHelp,

    // Window
    /// Terminal resized
    Resize(u16, u16),
    /// Redraw screen
    Redraw,

    // Application
    /// Quit the application
    Quit,
}

/// Pure function that updates the model based on a message.
///
/// All state transitions happen here. Loading documents and opening links
/// are side effects handled by the event loop.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::SelectNext => model.move_selection(1),
        Message::SelectPrev => model.move_selection(-1),
        Message::PageDown => {
            let step = page_step(&model);
            model.move_selection(step);
        }
        Message::PageUp => {
            let step = page_step(&model);
            model.move_selection(-step);
        }
        Message::SelectFirst => model.select_first(),
        Message::SelectLast => model.select_last(),
        Message::SelectRow(position) => {
            if let Some(index) = model.row_order().get(position).copied() {
                model.selected = Some(index);
                model.ensure_selection_visible();
            }
        }

        Message::Activate => match model.selected {
            Some(index) => {
                if model.viewer.on_row_activated(index.section, index.row).is_none() {
                    model.show_toast(ToastLevel::Info, "Row has no link");
                }
            }
            None => model.show_toast(ToastLevel::Info, "Nothing selected"),
        },
        Message::CycleLanguage => model.cycle_language(),
        Message::Tap => model.viewer.tapped(),
        Message::ListReloaded => model.normalize_selection(),

        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
        }
        Message::HideHelp => {
            model.help_visible = false;
        }
        // Back/ForceReload: handled in effects (document I/O)
        // Redraw: no state change needed
        Message::Back | Message::ForceReload | Message::Redraw => {}

        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
            let size = model.viewport_size();
            model.viewer.layout(size);
            model.ensure_selection_visible();
        }
        Message::Quit => {
            model.should_quit = true;
        }
    }
    model
}

/// Rows moved by a page step, based on the list height and row height.
fn page_step(model: &Model) -> isize {
    let row_lines = model.row_lines(crate::viewer::RowStyle::Simple).max(1);
    let rows = (model.list_height() / row_lines).max(1);
    isize::try_from(rows).unwrap_or(isize::MAX)
}
