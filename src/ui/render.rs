use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::app::{LineSlot, Model, RowIndex};
use crate::viewer::{RenderRow, RowStyle};

use super::{ICON_GLYPH, ROW_LEFT_PADDING, overlays, status};

/// Split the screen into title bar, list and status bar.
///
/// When the chrome is hidden the list takes the whole area and both bars are
/// zero-height.
pub fn split_chrome(area: Rect, chrome_visible: bool) -> [Rect; 3] {
    let bar = u16::from(chrome_visible);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(bar),
            Constraint::Min(0),
            Constraint::Length(bar),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let [title_area, list_area, status_area] = split_chrome(area, model.chrome_visible);

    if model.chrome_visible {
        status::render_title_bar(model, frame, title_area);
        if model.active_toast().is_some() {
            status::render_toast_bar(model, frame, status_area);
        } else {
            status::render_status_bar(model, frame, status_area);
        }
    }

    if model.is_loading() {
        render_loading(model, frame, list_area);
    } else {
        render_list(model, frame, list_area);
    }

    if model.help_visible {
        overlays::render_help_overlay(frame, area);
    }
}

fn render_loading(model: &Model, frame: &mut Frame, area: Rect) {
    let width = area.width.saturating_sub(8).clamp(1, 60);
    let height = 3.min(area.height);
    let gauge_area = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    let progress = f64::from(model.viewer.progress().clamp(0.0, 1.0));
    let resources = model.viewer.resources().map_or(0, std::collections::BTreeMap::len);
    let gauge = Gauge::default()
        .block(Block::default().title("Loading").borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(progress)
        .label(format!("{:.0}% of {resources} icons", progress * 100.0));
    frame.render_widget(gauge, gauge_area);
}

fn render_list(model: &Model, frame: &mut Frame, area: Rect) {
    let slots = model.line_layout();
    if slots.is_empty() {
        let empty = Paragraph::new(Line::styled(
            " (empty list)",
            Style::default().fg(Color::Indexed(245)),
        ));
        frame.render_widget(empty, area);
        return;
    }

    let width = area.width as usize;
    let lines: Vec<Line> = slots
        .iter()
        .skip(model.scroll_offset)
        .take(area.height as usize)
        .map(|slot| match *slot {
            LineSlot::Header(section) => header_line(model, section, width),
            LineSlot::Row { index, line } => {
                let row = model.viewer.row(index.section, index.row);
                row_line(&row, line, model.selected == Some(index), width)
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn header_line(model: &Model, section: usize, width: usize) -> Line<'static> {
    let title = model.viewer.section_title(section).unwrap_or_default();
    Line::styled(
        truncate_to_width(&format!(" {title}"), width),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )
}

fn row_line(row: &RenderRow, line: usize, selected: bool, width: usize) -> Line<'static> {
    let padding = " ".repeat(ROW_LEFT_PADDING);
    let (text, style) = match (line, row.style) {
        (0, _) => {
            let marker = if selected { ">" } else { " " };
            let icon = if row.icon.is_some() { ICON_GLYPH } else { " " };
            let title = row.title.as_deref().unwrap_or("(untitled)");
            let style = if row.title.is_some() {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Indexed(245))
            };
            (format!("{marker}{padding}{icon} {title}"), style)
        }
        (1, RowStyle::Detailed) => {
            let subtitle = row.subtitle.as_deref().unwrap_or_default();
            (
                format!(" {padding}  {subtitle}"),
                Style::default().fg(Color::Indexed(250)),
            )
        }
        _ => (String::new(), Style::default()),
    };
    let mut text = truncate_to_width(&text, width);
    if selected {
        let fill = width.saturating_sub(display_width(&text));
        text.push_str(&" ".repeat(fill));
        return Line::styled(text, style.reversed());
    }
    Line::styled(text, style)
}

/// The selected row, if any, resolved for display.
pub fn selected_row(model: &Model) -> Option<(RowIndex, RenderRow)> {
    let index = model.selected?;
    Some((index, model.viewer.row(index.section, index.row)))
}

fn display_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

/// Cut `text` to at most `width` terminal columns, ending in an ellipsis when
/// anything was dropped.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('\u{2026}');
    out
}
