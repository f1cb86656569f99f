use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use serde_json::json;
use url::Url;

use super::{
    ChannelDelegate, DEFAULT_ROW_HEIGHT, DocumentViewer, ListViewer, ProjectionState, RenderRow,
    RowStyle, ViewerEvent,
};
use crate::document::Size;
use crate::error::{FetchError, FetchFailure, ViewerError};
use crate::prefetch::{CancelToken, PrefetchUpdate, Prefetcher, ResourceSet};

/// What the test sees of a [`ManualPrefetcher`] after handing it to a viewer.
#[derive(Default)]
struct ManualHandle {
    senders: Vec<(CancelToken, Sender<PrefetchUpdate>)>,
    started: Vec<ResourceSet>,
    paths: HashMap<Url, PathBuf>,
}

/// Prefetcher that only reports what the test tells it to.
#[derive(Clone, Default)]
struct ManualPrefetcher {
    handle: Arc<Mutex<ManualHandle>>,
}

impl ManualPrefetcher {
    fn send(&self, load: usize, update: PrefetchUpdate) {
        let handle = self.handle.lock().unwrap();
        let (token, tx) = &handle.senders[load];
        let _ = tx.send(PrefetchUpdate {
            generation: token.generation(),
            ..update
        });
    }

    fn complete(&self, load: usize) {
        self.send(
            load,
            PrefetchUpdate {
                completed: true,
                ..PrefetchUpdate::default()
            },
        );
    }

    fn token(&self, load: usize) -> CancelToken {
        self.handle.lock().unwrap().senders[load].0.clone()
    }
}

impl Prefetcher for ManualPrefetcher {
    fn start(&mut self, resources: &ResourceSet, cancel: CancelToken, updates: Sender<PrefetchUpdate>) {
        let mut handle = self.handle.lock().unwrap();
        handle.started.push(resources.clone());
        handle.senders.push((cancel, updates));
    }

    fn progress(&self) -> f32 {
        0.5
    }

    fn map(&self, url: &Url) -> Option<PathBuf> {
        self.handle.lock().unwrap().paths.get(url).cloned()
    }
}

fn sample_document() -> serde_json::Value {
    json!({
        "title": "Samples",
        "rowHeight": "50%",
        "languages": [{ "id": "en", "title": "English" }, { "id": "fr", "title": "Français" }],
        "strings": { "k1": { "en": "Hello", "fr": "Bonjour" } },
        "sections": [
            {
                "title": { "ref": "k1" },
                "items": [
                    { "title": "Plain", "icon": "icons/a.png" },
                    { "title": { "ref": "k1" }, "text": "Greeting", "icon": "icons/a.png" }
                ]
            },
            {
                "items": [
                    { "url": "http://x/y" },
                    { "title": "Nowhere" }
                ]
            }
        ]
    })
}

fn base() -> Url {
    Url::parse("http://x/").unwrap()
}

fn load(viewer: &mut ListViewer) {
    viewer
        .load_document(
            &sample_document(),
            Size::new(320.0, 400.0),
            Some(base()),
            None,
            Box::new(|_, _| {}),
        )
        .unwrap();
}

fn viewer_with(prefetcher: &ManualPrefetcher) -> ListViewer {
    ListViewer::new(Box::new(prefetcher.clone()))
}

#[test]
fn test_invalid_document_fails_and_keeps_nothing() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    let err = viewer
        .load_document(
            &json!({ "title": "No lists" }),
            Size::default(),
            None,
            None,
            Box::new(|_, _| {}),
        )
        .unwrap_err();
    assert!(matches!(err, ViewerError::InvalidDocument));
    assert!(!viewer.is_loaded());
    assert!(prefetcher.handle.lock().unwrap().started.is_empty());
}

#[test]
fn test_sections_hidden_until_prefetch_completes() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    load(&mut viewer);

    assert_eq!(viewer.state(), Some(ProjectionState::Loading));
    assert_eq!(viewer.section_count(), 0);
    assert_eq!(viewer.row_count(0), 0);
    assert_eq!(viewer.section_title(0), None);
    assert_eq!(viewer.row(0, 0), RenderRow::empty());
    assert_eq!(viewer.poll_prefetch(), 0);
    assert!(!viewer.take_reload());

    prefetcher.send(0, PrefetchUpdate::default());
    assert_eq!(viewer.poll_prefetch(), 1);
    assert_eq!(viewer.section_count(), 0, "partial progress keeps the list blank");

    prefetcher.complete(0);
    viewer.poll_prefetch();
    assert_eq!(viewer.state(), Some(ProjectionState::Ready));
    assert_eq!(viewer.section_count(), 2);
    assert_eq!(viewer.row_count(0), 2);
    assert_eq!(viewer.row(0, 0).title.as_deref(), Some("Plain"));
    assert!(viewer.take_reload());
    assert!(!viewer.take_reload(), "reload signal is consumed");
}

#[test]
fn test_repeated_completion_is_idempotent() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    load(&mut viewer);
    prefetcher.complete(0);
    viewer.poll_prefetch();
    let before = viewer.snapshot();

    prefetcher.complete(0);
    viewer.poll_prefetch();
    assert_eq!(viewer.section_count(), 2);
    assert_eq!(viewer.snapshot(), before);
}

#[test]
fn test_rows_resolve_titles_styles_and_url_fallback() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    load(&mut viewer);
    prefetcher.complete(0);
    viewer.poll_prefetch();

    assert_eq!(viewer.section_title(0).as_deref(), Some("Hello"));
    assert_eq!(viewer.section_title(1), None);

    let plain = viewer.row(0, 0);
    assert_eq!(plain.style, RowStyle::Simple);
    assert_eq!(plain.title.as_deref(), Some("Plain"));
    assert_eq!(plain.icon, None, "unfetched icons are omitted");

    let detailed = viewer.row(0, 1);
    assert_eq!(detailed.style, RowStyle::Detailed);
    assert_eq!(detailed.title.as_deref(), Some("Hello"));
    assert_eq!(detailed.subtitle.as_deref(), Some("Greeting"));

    assert_eq!(viewer.row(1, 0).title.as_deref(), Some("http://x/y"));
}

#[test]
fn test_reload_with_language_id_rerenders_in_place() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    load(&mut viewer);
    prefetcher.complete(0);
    viewer.poll_prefetch();
    assert!(viewer.take_reload());

    viewer.reload_with_language_id("fr");
    assert!(viewer.take_reload());
    assert_eq!(viewer.lang_id(), "fr");
    assert_eq!(viewer.state(), Some(ProjectionState::Ready));
    assert_eq!(viewer.section_title(0).as_deref(), Some("Bonjour"));
    assert_eq!(viewer.row(0, 1).title.as_deref(), Some("Bonjour"));
    assert_eq!(
        prefetcher.handle.lock().unwrap().started.len(),
        1,
        "language changes do not reload the document"
    );
}

#[test]
fn test_preferred_language_picked_at_load() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = ListViewer::new(Box::new(prefetcher.clone()))
        .with_language_preferences(vec!["de".into(), "fr-CA".into()]);
    load(&mut viewer);
    assert_eq!(viewer.lang_id(), "fr");
    assert_eq!(viewer.languages().map(<[_]>::len), Some(2));
}

#[test]
fn test_resources_deduplicated_and_handed_to_prefetcher() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    load(&mut viewer);
    let handle = prefetcher.handle.lock().unwrap();
    let keys: Vec<_> = handle.started[0].keys().map(Url::as_str).collect();
    assert_eq!(keys, vec!["http://x/icons/a.png"]);
}

#[test]
fn test_row_activation_routes_to_delegate() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    let (delegate, events) = ChannelDelegate::channel();
    viewer.set_delegate(Box::new(delegate));
    load(&mut viewer);
    prefetcher.complete(0);
    viewer.poll_prefetch();

    assert_eq!(viewer.on_row_activated(1, 1), None);
    assert!(events.try_recv().is_err(), "items without url navigate nowhere");

    let request = viewer.on_row_activated(1, 0).unwrap();
    assert_eq!(request.url.as_str(), "http://x/y");
    assert_eq!(
        events.try_recv().unwrap(),
        ViewerEvent::BrowseTo(Url::parse("http://x/y").unwrap())
    );

    viewer.tapped();
    assert_eq!(events.try_recv().unwrap(), ViewerEvent::Tapped);
}

#[test]
fn test_stale_generation_updates_are_ignored() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    load(&mut viewer);
    let first = prefetcher.token(0);
    load(&mut viewer);
    assert!(first.is_cancelled(), "reloading cancels the previous prefetch");

    prefetcher.complete(0);
    assert_eq!(viewer.poll_prefetch(), 0);
    assert_eq!(viewer.section_count(), 0);

    prefetcher.complete(1);
    viewer.poll_prefetch();
    assert_eq!(viewer.section_count(), 2);
}

#[test]
fn test_discard_ignores_late_callbacks() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    viewer
        .load_document(
            &sample_document(),
            Size::new(320.0, 400.0),
            Some(base()),
            None,
            Box::new(move |progress, failure| {
                sink.borrow_mut().push((progress, failure.is_some()));
            }),
        )
        .unwrap();

    viewer.discard();
    assert!(prefetcher.token(0).is_cancelled());
    prefetcher.complete(0);
    assert_eq!(viewer.poll_prefetch(), 0);
    assert!(calls.borrow().is_empty());
    assert_eq!(viewer.section_count(), 0);
    assert!(!viewer.is_loaded());
}

#[test]
fn test_failures_reported_through_progress_callback() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    viewer
        .load_document(
            &sample_document(),
            Size::new(320.0, 400.0),
            Some(base()),
            None,
            Box::new(move |progress, failure| {
                sink.borrow_mut()
                    .push((progress, failure.map(|f| f.url.to_string())));
            }),
        )
        .unwrap();

    let url = Url::parse("http://x/icons/a.png").unwrap();
    prefetcher.send(
        0,
        PrefetchUpdate {
            completed: true,
            failed: vec![FetchFailure {
                url: url.clone(),
                error: FetchError::HttpStatus(404),
            }],
            ..PrefetchUpdate::default()
        },
    );
    viewer.poll_prefetch();

    assert_eq!(
        calls.borrow().as_slice(),
        &[(0.5, Some(url.to_string()))]
    );
    assert_eq!(viewer.state(), Some(ProjectionState::Ready));
    assert_eq!(viewer.row(0, 0).icon, None);
}

#[test]
fn test_row_height_resolves_percent_of_viewport() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    assert!((viewer.row_height() - DEFAULT_ROW_HEIGHT).abs() < f32::EPSILON);
    load(&mut viewer);
    assert!((viewer.row_height() - 200.0).abs() < f32::EPSILON);
    viewer.layout(Size::new(320.0, 100.0));
    assert!((viewer.row_height() - 50.0).abs() < f32::EPSILON);
}

#[test]
fn test_capability_surface_defaults() {
    let prefetcher = ManualPrefetcher::default();
    let mut viewer = viewer_with(&prefetcher);
    assert_eq!(viewer.document_title(), None);
    load(&mut viewer);
    assert_eq!(viewer.document_title(), Some("Samples"));
    assert!(!viewer.hide_ui());
    assert!(!viewer.landscape());
    assert!(viewer.save_state().is_none());
    assert_eq!(viewer.page_index(), None);
    assert_eq!(viewer.page_count(), None);
    viewer.move_to_page_at(3);
    viewer.become_zombie();
    assert!(viewer.is_loaded(), "becoming a zombie keeps the document");
}
