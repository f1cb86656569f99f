use crossterm::event::{self, Event, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;

use crate::app::model::LineSlot;
use crate::app::{App, Message, Model};

use super::event_loop::ResizeDebouncer;

impl App {
    pub(super) fn handle_event(
        event: Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(key, model),
            Event::Mouse(mouse) => Self::handle_mouse(mouse, model),
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(w, h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return None;
        }
        match mouse.kind {
            MouseEventKind::ScrollDown => Some(Message::SelectNext),
            MouseEventKind::ScrollUp => Some(Message::SelectPrev),
            MouseEventKind::Up(MouseButton::Left) => {
                let position = row_position_at(model, mouse.row)?;
                let clicked = model.row_order().get(position).copied();
                if clicked.is_some() && clicked == model.selected {
                    Some(Message::Activate)
                } else {
                    Some(Message::SelectRow(position))
                }
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: event::KeyEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return Some(Message::HideHelp);
        }

        match key.code {
            // Navigation
            KeyCode::Char('j') | KeyCode::Down => Some(Message::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::SelectPrev),
            KeyCode::Char(' ') | KeyCode::PageDown => Some(Message::PageDown),
            KeyCode::Char('b') | KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::SelectFirst),
            KeyCode::Char('G') | KeyCode::End => Some(Message::SelectLast),

            // Viewer
            KeyCode::Enter | KeyCode::Right => Some(Message::Activate),
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => Some(Message::Back),
            KeyCode::Char('l') => Some(Message::CycleLanguage),
            KeyCode::Char('t') => Some(Message::Tap),
            KeyCode::Char('r' | 'R') => Some(Message::ForceReload),
            KeyCode::Char('?') | KeyCode::F(1) => Some(Message::ToggleHelp),

            // Quit
            KeyCode::Char('q') | KeyCode::Esc => Some(Message::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Message::Quit)
            }

            _ => None,
        }
    }

    pub(super) fn view(model: &Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}

/// Display-order position of the row drawn on terminal `row`.
fn row_position_at(model: &Model, row: u16) -> Option<usize> {
    let top = u16::from(model.chrome_visible);
    let rel = usize::from(row.checked_sub(top)?);
    if rel >= model.list_height() {
        return None;
    }
    let slot = model.line_layout().get(model.scroll_offset + rel).copied()?;
    let LineSlot::Row { index, .. } = slot else {
        return None;
    };
    model.row_order().iter().position(|candidate| *candidate == index)
}
