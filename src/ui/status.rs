use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::Model;
use crate::viewer::DocumentViewer;

use super::render::{selected_row, truncate_to_width};

pub fn render_title_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let title = model.viewer.document_title().unwrap_or("untitled");
    let lang = match model.viewer.languages() {
        Some(languages) => languages
            .iter()
            .find(|lang| lang.id == model.viewer.lang_id())
            .and_then(|lang| lang.title.clone())
            .map_or_else(
                || format!("  [{}]", model.viewer.lang_id()),
                |name| format!("  [{name}]"),
            ),
        None => String::new(),
    };
    let back = if model.history.is_empty() { "" } else { "< " };
    let text = truncate_to_width(&format!(" {back}{title}{lang}"), area.width as usize);
    let bar = Paragraph::new(text).style(
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(bar, area);
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let order = model.row_order();
    let position = model
        .selected
        .and_then(|sel| order.iter().position(|idx| *idx == sel))
        .map_or(0, |pos| pos + 1);

    let state = if model.is_loading() {
        format!("loading {:.0}%", model.viewer.progress() * 100.0)
    } else {
        format!("Row {position}/{}", order.len())
    };
    let link = selected_row(model)
        .and_then(|(index, _)| {
            model
                .viewer
                .document()?
                .item(index.section, index.row)?
                .url
                .clone()
        })
        .map(|url| format!("  {url}"))
        .unwrap_or_default();

    let status = format!(" {state}{link}  ?:help");
    let status_bar = Paragraph::new(truncate_to_width(&status, area.width as usize))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        crate::app::ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        crate::app::ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        crate::app::ToastLevel::Error => {
            ("[error]", Style::default().bg(Color::Red).fg(Color::White))
        }
    };
    let text = truncate_to_width(&format!("{prefix} {message}"), area.width as usize);
    frame.render_widget(Paragraph::new(text).style(style), area);
}
