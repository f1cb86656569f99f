use super::*;
use crate::app::{Message, Model, update};
use crate::prefetch::FilePrefetcher;
use crate::viewer::ListViewer;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use serde_json::{Value, json};
use url::Url;

fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).unwrap()
}

fn loaded_model(raw: &Value, size: (u16, u16), complete: bool) -> Model {
    let prefetcher = FilePrefetcher::new(std::env::temp_dir().join("swipe-list-ui-tests"), 1);
    let viewer =
        ListViewer::new(Box::new(prefetcher)).with_language_preferences(vec!["fr".to_string()]);
    let mut model = Model::new(viewer, size);
    model
        .load_document(Url::parse("file:///lists/main.json").unwrap(), raw)
        .unwrap();
    if complete {
        model.viewer.poll_prefetch();
        model.viewer.take_reload();
        model = update(model, Message::ListReloaded);
    }
    model
}

fn sample_document() -> Value {
    json!({
        "title": "Recettes",
        "languages": [
            { "id": "en", "title": "English" },
            { "id": "fr", "title": "Fran\u{e7}ais" }
        ],
        "sections": [
            {
                "title": { "en": "Soups", "fr": "Soupes" },
                "items": [
                    { "title": "Minestrone", "text": { "en": "Italian", "fr": "Italienne" } },
                    { "title": "Pho" }
                ]
            }
        ]
    })
}

fn buffer_lines(terminal: &Terminal<TestBackend>) -> Vec<String> {
    let buffer = terminal.backend().buffer();
    let area = buffer.area;
    (0..area.height)
        .map(|y| {
            (0..area.width)
                .map(|x| buffer[(x, y)].symbol().to_string())
                .collect::<String>()
        })
        .collect()
}

#[test]
fn test_render_shows_sections_rows_and_subtitles() {
    let model = loaded_model(&sample_document(), (60, 16), true);
    let mut terminal = create_test_terminal(60, 16);
    terminal.draw(|frame| render(&model, frame)).unwrap();

    let lines = buffer_lines(&terminal);
    assert!(lines[0].contains("Recettes"));
    assert!(lines[0].contains("[Fran\u{e7}ais]"));
    assert!(lines[1].contains("Soupes"));
    assert!(lines[2].starts_with(">"));
    assert!(lines[2].contains("Minestrone"));
    assert!(lines[3].contains("Italienne"));
    assert!(lines[4].contains("Pho"));
    assert!(lines[15].contains("Row 1/2"));
}

#[test]
fn test_render_loading_shows_gauge_instead_of_rows() {
    let raw = json!({
        "items": [{ "title": "Iconic", "icon": "file:///nonexistent/swipe-list/icon.png" }]
    });
    let model = loaded_model(&raw, (60, 16), false);
    assert!(model.is_loading());

    let mut terminal = create_test_terminal(60, 16);
    terminal.draw(|frame| render(&model, frame)).unwrap();
    let content = buffer_lines(&terminal).join("\n");
    assert!(content.contains("Loading"));
    assert!(content.contains("of 1 icons"));
    assert!(!content.contains("Iconic"));
    assert!(content.contains("loading"));
}

#[test]
fn test_render_selected_row_is_reversed() {
    let model = loaded_model(&sample_document(), (40, 12), true);
    let mut terminal = create_test_terminal(40, 12);
    terminal.draw(|frame| render(&model, frame)).unwrap();

    let buffer = terminal.backend().buffer();
    let cell = &buffer[(0, 2)];
    assert!(cell.modifier.contains(ratatui::style::Modifier::REVERSED));
    let unselected = &buffer[(0, 4)];
    assert!(!unselected.modifier.contains(ratatui::style::Modifier::REVERSED));
}

#[test]
fn test_render_empty_list() {
    let model = loaded_model(&json!({ "items": [] }), (40, 8), true);
    let mut terminal = create_test_terminal(40, 8);
    terminal.draw(|frame| render(&model, frame)).unwrap();
    let content = buffer_lines(&terminal).join("\n");
    assert!(content.contains("(empty list)"));
    assert!(content.contains("untitled"));
}

#[test]
fn test_render_toast_replaces_status_bar() {
    let model = loaded_model(&json!({ "items": [{ "title": "solo" }] }), (50, 8), true);
    let model = update(model, Message::Activate);
    let mut terminal = create_test_terminal(50, 8);
    terminal.draw(|frame| render(&model, frame)).unwrap();
    let lines = buffer_lines(&terminal);
    assert!(lines[7].contains("[info] Row has no link"));
}

#[test]
fn test_render_help_overlay() {
    let model = loaded_model(&sample_document(), (60, 24), true);
    let model = update(model, Message::ToggleHelp);
    let mut terminal = create_test_terminal(60, 24);
    terminal.draw(|frame| render(&model, frame)).unwrap();
    let content = buffer_lines(&terminal).join("\n");
    assert!(content.contains("Help"));
    assert!(content.contains("Next language"));
}

#[test]
fn test_split_chrome_hides_bars() {
    let area = Rect::new(0, 0, 40, 10);
    let [title, list, status] = split_chrome(area, true);
    assert_eq!((title.height, list.height, status.height), (1, 8, 1));
    assert_eq!(status.y, 9);

    let [title, list, status] = split_chrome(area, false);
    assert_eq!((title.height, list.height, status.height), (0, 10, 0));
}

#[test]
fn test_truncate_to_width_respects_wide_chars() {
    assert_eq!(truncate_to_width("short", 10), "short");
    assert_eq!(truncate_to_width("abcdef", 4), "abc\u{2026}");
    // Each CJK character is two columns wide.
    assert_eq!(truncate_to_width("\u{65e5}\u{672c}\u{8a9e}", 5), "\u{65e5}\u{672c}\u{2026}");
    assert_eq!(truncate_to_width("abc", 0), "");
}
