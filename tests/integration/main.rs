//! Integration tests for Meshgraph
//!
//! These drive the engine handle against real directories.

use meshgraph_core::{Filter, GraphEvent, MetaTableSpec};
use meshgraph_engine::{Engine, EngineConfig};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn sample_wiki() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "A.md", "---\nstatus: draft\n---\nLinks to [[B]].");
    write(dir.path(), "B.md", "---\nstatus: active\n---\nNo links.");
    dir
}

fn collect_events(engine: &Engine, done: impl Fn(&[GraphEvent]) -> bool) -> Vec<GraphEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        seen.extend(engine.poll_events());
        if done(&seen) {
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }
    seen
}

#[test]
fn test_concrete_scenario() {
    let dir = sample_wiki();
    let engine = Engine::new(dir.path()).unwrap();

    let drafts = engine.query(&[Filter::equals("status", "draft")]).unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].name, "A");
    assert_eq!(engine.get_backlinks("B"), vec!["A"]);

    let table = engine
        .metatable(&[], &["name".to_string(), "status".to_string()])
        .unwrap();
    let rows: Vec<(&str, &str)> = table
        .rows
        .iter()
        .map(|row| (row.get("name"), row.get("status")))
        .collect();
    assert_eq!(rows, vec![("A", "draft"), ("B", "active")]);
}

#[test]
fn test_metatable_macro_syntax() {
    let dir = sample_wiki();
    write(dir.path(), "C.md", "---\nstatus: draft\ntags: [x, y]\n---\n[[B]]");
    let engine = Engine::new(dir.path()).unwrap();

    let spec = MetaTableSpec::parse("status=draft, ->B, ||name||tags||");
    let table = engine.metatable(&spec.filters, &spec.columns).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[0].get("name"), "A");
    assert_eq!(table.rows[0].get("tags"), "");
    assert_eq!(table.rows[1].get("tags"), "x, y");
}

#[test]
fn test_deterministic_scan() {
    let dir = sample_wiki();
    write(dir.path(), "sub/C.md", "[[A]] [[Ghost]]");

    let first = Engine::new(dir.path()).unwrap();
    let second = Engine::new(dir.path()).unwrap();
    assert_eq!(first.list_pages(), second.list_pages());
    for name in ["A", "B", "C"] {
        assert_eq!(first.get_backlinks(name), second.get_backlinks(name));
        assert_eq!(first.get_outlinks(name), second.get_outlinks(name));
    }
    assert_eq!(first.dangling_links(), vec![("C".to_string(), "Ghost".to_string())]);
}

#[test]
fn test_round_trip_metadata_change() {
    let dir = sample_wiki();
    let engine = Engine::new(dir.path()).unwrap();

    write(dir.path(), "A.md", "---\nstatus: active\n---\nLinks to [[B]].");
    assert_eq!(engine.sync_path("A.md"), vec![GraphEvent::updated("A")]);
    assert!(engine.query(&[Filter::equals("status", "draft")]).unwrap().is_empty());
    assert_eq!(
        engine
            .query(&[Filter::equals("status", "active")])
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_rebuild_is_idempotent() {
    let dir = sample_wiki();
    let engine = Engine::new(dir.path()).unwrap();
    let before = engine.list_pages();

    engine.rebuild();
    engine.rebuild();
    assert!(engine.poll_events().is_empty());
    let after = engine.list_pages();
    assert_eq!(before, after);
    assert_eq!(engine.get_backlinks("B"), vec!["A"]);
}

#[test]
fn test_cascading_delete() {
    let dir = sample_wiki();
    let engine = Engine::new(dir.path()).unwrap();

    fs::remove_file(dir.path().join("A.md")).unwrap();
    let events = engine.sync_path("A.md");
    assert_eq!(
        events,
        vec![GraphEvent::deleted("A"), GraphEvent::link_removed("A", "B")]
    );
    assert!(engine.get_backlinks("B").is_empty());
    assert!(!engine.page_exists("A"));
}

#[test]
fn test_dangling_then_resolved() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "A.md", "[[Future]]");
    let engine = Engine::new(dir.path()).unwrap();

    assert!(!engine.page_exists("Future"));
    assert_eq!(engine.get_backlinks("Future"), vec!["A"]);
    assert!(engine.get_outlinks_detailed("A")[0].dangling);

    write(dir.path(), "Future.md", "---\nstatus: new\n---\n");
    assert_eq!(engine.sync_path("Future.md"), vec![GraphEvent::created("Future")]);
    assert!(engine.page_exists("Future"));
    assert_eq!(engine.get_backlinks("Future"), vec!["A"]);
    assert!(engine.dangling_links().is_empty());
}

#[test]
fn test_filter_conjunction() {
    let dir = sample_wiki();
    write(dir.path(), "C.md", "---\nstatus: draft\n---\nNo links.");
    let engine = Engine::new(dir.path()).unwrap();

    let filters = [Filter::equals("status", "draft"), Filter::links_to("B")];
    let both: Vec<_> = engine
        .query(&filters)
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(both, vec!["A"]);

    let drafts = engine.query(&filters[..1]).unwrap().len();
    let linking = engine.query(&filters[1..]).unwrap().len();
    assert_eq!(drafts, 2);
    assert_eq!(linking, 1);
}

#[test]
fn test_live_watcher_debounces_rapid_writes() {
    let dir = sample_wiki();
    let config = EngineConfig {
        debounce_ms: 200,
        watch: true,
        ..EngineConfig::new(dir.path())
    };
    let engine = Engine::open(config).unwrap();
    assert!(engine.is_watching());

    for i in 0..5 {
        write(
            dir.path(),
            "A.md",
            &format!("---\nstatus: draft\nrev: {i}\n---\nLinks to [[B]]."),
        );
        thread::sleep(Duration::from_millis(20));
    }

    let mut events = collect_events(&engine, |seen| !seen.is_empty());
    thread::sleep(Duration::from_millis(500));
    events.extend(engine.poll_events());
    assert_eq!(events, vec![GraphEvent::updated("A")]);
    assert_eq!(engine.get_metadata("A").unwrap()["rev"], vec!["4"]);

    engine.stop_watching();
    assert!(!engine.is_watching());
}

#[test]
fn test_live_watcher_sees_new_and_deleted_pages() {
    let dir = sample_wiki();
    let engine = Engine::new(dir.path()).unwrap();
    engine.start_watching().unwrap();

    write(dir.path(), "C.md", "[[A]]");
    let events = collect_events(&engine, |seen| seen.len() >= 2);
    assert_eq!(
        events,
        vec![GraphEvent::created("C"), GraphEvent::link_created("C", "A")]
    );

    fs::remove_file(dir.path().join("C.md")).unwrap();
    let events = collect_events(&engine, |seen| seen.len() >= 2);
    assert_eq!(
        events,
        vec![GraphEvent::deleted("C"), GraphEvent::link_removed("C", "A")]
    );
}

#[test]
fn test_start_watching_missing_root_fails() {
    let dir = TempDir::new().unwrap();
    let engine = Engine::new(dir.path().join("gone")).unwrap();
    assert!(engine.start_watching().is_err());
    assert!(engine.list_pages().is_empty());
}
