use std::io::stdout;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use crossterm::event;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;
use serde::Serialize;

use crate::app::source::{document_url, read_document};
use crate::app::{App, Message, Model, ToastLevel, update};
use crate::document::is_list_document;
use crate::prefetch::FilePrefetcher;
use crate::viewer::{
    ChannelDelegate, DocumentViewer, ListViewer, ProjectionState, SectionSnapshot, ViewerEvent,
};

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Everything `--dump` prints once prefetching finishes.
#[derive(Debug, Serialize)]
struct Dump<'a> {
    title: Option<&'a str>,
    lang: &'a str,
    row_height: f32,
    progress: f32,
    sections: Vec<SectionSnapshot>,
}

impl App {
    fn build_viewer(&self) -> (ListViewer, Receiver<ViewerEvent>) {
        let prefetcher = FilePrefetcher::new(self.cache_dir.clone(), self.workers);
        let mut viewer = ListViewer::new(Box::new(prefetcher))
            .with_language_preferences(self.language_preferences.clone());
        let (delegate, events) = ChannelDelegate::channel();
        viewer.set_delegate(Box::new(delegate));
        (viewer, events)
    }

    /// Read the initial document and build a model around it.
    fn initial_model(&self, terminal_size: (u16, u16)) -> Result<(Model, Receiver<ViewerEvent>)> {
        let url = document_url(&self.document)?;
        let raw = read_document(&url)?;
        if !is_list_document(&raw) {
            bail!("Not a list document: {url}");
        }
        let (viewer, events) = self.build_viewer();
        let mut model = Model::new(viewer, terminal_size);
        model
            .load_document(url, &raw)
            .context("Failed to load list document")?;
        Ok((model, events))
    }

    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed, or if
    /// terminal initialization or the event loop hits an I/O failure.
    pub fn run(&self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        // Load before entering raw mode so document errors print normally
        let size = crossterm::terminal::size().unwrap_or((80, 24));
        let (model, events) = self.initial_model(size)?;

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; swipe-list requires an interactive terminal")?;
        drop(init_scope);

        let result = execute!(stdout(), EnableMouseCapture)
            .context("Failed to enable mouse capture")
            .and_then(|()| Self::event_loop(&mut terminal, model, &events));

        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();

        result
    }

    /// Load the document, wait for prefetching, and print the rendered list
    /// as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be loaded or prefetching does
    /// not finish within `timeout`.
    pub fn dump(&self, timeout: Duration) -> Result<String> {
        let (mut model, _events) = self.initial_model((80, 24))?;
        let deadline = Instant::now() + timeout;
        while model.viewer.state() == Some(ProjectionState::Loading) {
            model.viewer.poll_prefetch();
            if Instant::now() >= deadline {
                bail!("Timed out waiting for resources after {timeout:?}");
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        for note in model.drain_progress_notes() {
            if let Some(failure) = note.failure {
                tracing::warn!(%failure, "resource unavailable");
            }
        }
        let viewer = &model.viewer;
        let dump = Dump {
            title: viewer.document_title(),
            lang: viewer.lang_id(),
            row_height: viewer.row_height(),
            progress: viewer.progress(),
            sections: viewer.snapshot(),
        };
        serde_json::to_string_pretty(&dump).context("Failed to serialize list")
    }

    fn event_loop(
        terminal: &mut DefaultTerminal,
        mut model: Model,
        events: &Receiver<ViewerEvent>,
    ) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        let size = terminal.size()?;
        model = update(model, Message::Resize(size.width, size.height));

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event(
                    "event.resize.apply",
                    format!("frame={frame_idx} width={width} height={height}"),
                );
                model = update(model, Message::Resize(width, height));
                needs_render = true;
            }

            if model.viewer.poll_prefetch() > 0 {
                for note in model.drain_progress_notes() {
                    if let Some(failure) = note.failure {
                        model.show_toast(ToastLevel::Warning, failure);
                    }
                }
                needs_render = true;
            }
            if model.viewer.take_reload() {
                model = update(model, Message::ListReloaded);
                needs_render = true;
            }

            while let Ok(viewer_event) = events.try_recv() {
                crate::perf::log_event("viewer.event", format!("{viewer_event:?}"));
                Self::handle_viewer_event(&mut model, viewer_event);
                needs_render = true;
            }

            // Handle events
            let poll_ms = if needs_render {
                0
            } else if resize_debouncer.is_pending() || model.is_loading() {
                10
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Refresh timestamp after poll wait so debouncers use accurate times.
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                let msg = Self::handle_event(event::read()?, &model, event_ms, &mut resize_debouncer);
                if let Some(msg) = msg {
                    crate::perf::log_event(
                        "event.message",
                        format!("frame={frame_idx} msg={msg:?}"),
                    );
                    let side_msg = msg.clone();
                    model = update(model, msg);
                    Self::handle_message_side_effects(&mut model, &side_msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let msg =
                        Self::handle_event(event::read()?, &model, drain_ms, &mut resize_debouncer);
                    if let Some(msg) = msg {
                        drained += 1;
                        let side_msg = msg.clone();
                        model = update(model, msg);
                        Self::handle_message_side_effects(&mut model, &side_msg);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }

            if needs_render {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| Self::view(&model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3} offset={} loading={}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0,
                        model.scroll_offset,
                        model.is_loading()
                    ),
                );
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
