//! End-to-end loads with the file prefetcher and real icon files.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;

use swipe_list::app::App;
use swipe_list::document::Size;
use swipe_list::prefetch::FilePrefetcher;
use swipe_list::viewer::{DocumentViewer, ListViewer, ProjectionState, RowStyle};

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn write_icon(&self, name: &str) {
        let img = RgbaImage::from_pixel(4, 4, Rgba([200, 40, 40, 255]));
        img.save(self.dir.path().join(name)).unwrap();
    }

    fn write(&self, name: &str, contents: &str) {
        std::fs::write(self.dir.path().join(name), contents).unwrap();
    }

    fn base_url(&self) -> Url {
        Url::from_file_path(self.dir.path().join("list.json")).unwrap()
    }

    fn cache_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("cache")
    }
}

type Reports = Rc<RefCell<Vec<(f32, Option<String>)>>>;

fn load(viewer: &mut ListViewer, raw: &Value, base: Url) -> Reports {
    let reports: Reports = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reports);
    viewer
        .load_document(
            raw,
            Size::new(320.0, 480.0),
            Some(base),
            None,
            Box::new(move |progress, failure| {
                sink.borrow_mut()
                    .push((progress, failure.map(ToString::to_string)));
            }),
        )
        .unwrap();
    reports
}

fn wait_until_ready(viewer: &mut ListViewer) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while viewer.state() != Some(ProjectionState::Ready) {
        viewer.poll_prefetch();
        assert!(Instant::now() < deadline, "prefetch did not complete");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_icons_are_prefetched_before_rows_appear() {
    let fx = Fixture::new();
    fx.write_icon("soup.png");
    fx.write_icon("bread.png");
    let raw = json!({
        "title": "Menu",
        "sections": [{
            "title": "Food",
            "items": [
                { "title": "Soup", "icon": "soup.png" },
                { "title": "Bread", "text": "Fresh", "icon": "bread.png" },
                { "title": "Soup again", "icon": "soup.png" }
            ]
        }]
    });

    let mut viewer = ListViewer::new(Box::new(FilePrefetcher::new(fx.cache_dir(), 2)));
    let reports = load(&mut viewer, &raw, fx.base_url());
    assert_eq!(viewer.resources().unwrap().len(), 2);
    assert_eq!(viewer.section_count(), 0);

    wait_until_ready(&mut viewer);
    assert!(viewer.take_reload());
    assert!(!viewer.take_reload());
    assert_eq!(viewer.section_count(), 1);
    assert!((viewer.progress() - 1.0).abs() < f32::EPSILON);

    let soup = viewer.row(0, 0);
    let bread = viewer.row(0, 1);
    let again = viewer.row(0, 2);
    let soup_icon = soup.icon.expect("soup icon");
    assert!(soup_icon.starts_with(fx.cache_dir()));
    assert_eq!(again.icon.as_deref(), Some(soup_icon.as_path()));
    assert_eq!(bread.style, RowStyle::Detailed);
    assert!(bread.icon.is_some());
    assert!(reports.borrow().iter().all(|(_, failure)| failure.is_none()));
}

#[test]
fn test_missing_and_corrupt_icons_leave_rows_without_icons() {
    let fx = Fixture::new();
    fx.write("broken.png", "definitely not a png");
    let raw = json!({
        "items": [
            { "title": "Missing", "icon": "missing.png" },
            { "title": "Broken", "icon": "broken.png" }
        ]
    });

    let mut viewer = ListViewer::new(Box::new(FilePrefetcher::new(fx.cache_dir(), 1)));
    let reports = load(&mut viewer, &raw, fx.base_url());
    wait_until_ready(&mut viewer);

    assert_eq!(viewer.row(0, 0).icon, None);
    assert_eq!(viewer.row(0, 1).icon, None);
    assert_eq!(viewer.row(0, 1).title.as_deref(), Some("Broken"));

    let failures: Vec<String> = reports
        .borrow()
        .iter()
        .filter_map(|(_, failure)| failure.clone())
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("missing.png"));
}

#[test]
fn test_second_load_supersedes_first() {
    let fx = Fixture::new();
    fx.write_icon("a.png");
    fx.write_icon("b.png");
    let first = json!({ "title": "First", "items": [{ "title": "A", "icon": "a.png" }] });
    let second = json!({ "title": "Second", "items": [{ "title": "B", "icon": "b.png" }] });

    let mut viewer = ListViewer::new(Box::new(FilePrefetcher::new(fx.cache_dir(), 1)));
    let first_reports = load(&mut viewer, &first, fx.base_url());
    let second_reports = load(&mut viewer, &second, fx.base_url());
    wait_until_ready(&mut viewer);

    assert_eq!(viewer.document_title(), Some("Second"));
    assert_eq!(viewer.row(0, 0).title.as_deref(), Some("B"));
    assert!(first_reports.borrow().is_empty());
    assert!(!second_reports.borrow().is_empty());
}

#[test]
fn test_cached_icons_survive_a_new_viewer() {
    let fx = Fixture::new();
    fx.write_icon("logo.png");
    let raw = json!({ "items": [{ "title": "Logo", "icon": "logo.png" }] });

    let mut viewer = ListViewer::new(Box::new(FilePrefetcher::new(fx.cache_dir(), 1)));
    load(&mut viewer, &raw, fx.base_url());
    wait_until_ready(&mut viewer);
    let cached = viewer.row(0, 0).icon.unwrap();
    drop(viewer);

    std::fs::remove_file(fx.dir.path().join("logo.png")).unwrap();
    let mut viewer = ListViewer::new(Box::new(FilePrefetcher::new(fx.cache_dir(), 1)));
    let reports = load(&mut viewer, &raw, fx.base_url());
    wait_until_ready(&mut viewer);
    assert_eq!(viewer.row(0, 0).icon, Some(cached));
    assert!(reports.borrow().iter().all(|(_, failure)| failure.is_none()));
}

#[test]
fn test_dump_prints_rendered_rows() {
    let fx = Fixture::new();
    fx.write_icon("star.png");
    let doc = json!({
        "title": "Stars",
        "rowHeight": 60,
        "languages": [{ "id": "en" }, { "id": "de" }],
        "items": [
            { "title": { "en": "Sirius", "de": "Sirius" }, "icon": "star.png", "url": "sirius.json" },
            { "url": "https://example.com/vega" }
        ]
    });
    fx.write("list.json", &doc.to_string());
    let path = fx.dir.path().join("list.json");

    let output = App::new(path.to_str().unwrap())
        .with_language_preferences(vec!["de-AT".to_string(), "en".to_string()])
        .with_cache_dir(fx.cache_dir())
        .with_workers(1)
        .dump(Duration::from_secs(10))
        .unwrap();

    let value: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["title"], "Stars");
    assert_eq!(value["lang"], "de");
    assert_eq!(value["row_height"], 60.0);
    let rows = &value["sections"][0]["rows"];
    assert_eq!(rows[0]["title"], "Sirius");
    assert_eq!(rows[0]["style"], "simple");
    assert!(Path::new(rows[0]["icon"].as_str().unwrap()).exists());
    assert_eq!(rows[1]["title"], "https://example.com/vega");
    assert!(rows[1]["icon"].is_null());
}

#[test]
fn test_dump_rejects_invalid_document() {
    let fx = Fixture::new();
    fx.write("list.json", r#"{ "title": "No rows" }"#);
    let path = fx.dir.path().join("list.json");
    let err = App::new(path.to_str().unwrap())
        .with_cache_dir(fx.cache_dir())
        .dump(Duration::from_secs(1))
        .unwrap_err();
    assert!(format!("{err:#}").contains("sections"));
}
