//! Scenario tests across graph, diff, query and event modules

use crate::test_utils::{page_with, record};
use crate::*;

fn names(pages: &[PageNode]) -> Vec<&str> {
    pages.iter().map(|p| p.name.as_str()).collect()
}

#[test]
fn tagged_page_linking_to_plain_page() {
    let graph = Graph::from_pages(vec![
        record("A", &[("tag", &["x"])], &["B"]),
        record("B", &[], &[]),
    ]);

    let pages = query(&graph, &[Filter::has_key("tag")]).unwrap();
    assert_eq!(names(&pages), vec!["A"]);
    assert_eq!(graph.get_backlinks("B"), vec!["A"]);

    let columns = vec!["name".to_string(), "tag".to_string()];
    let table = metatable(&graph, &[], &columns).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[0].get("name"), "A");
    assert_eq!(table.rows[0].get("tag"), "x");
    assert_eq!(table.rows[1].get("name"), "B");
    assert_eq!(table.rows[1].get("tag"), "");
}

#[test]
fn status_round_trip_through_reapply() {
    let mut graph = Graph::new();
    graph.apply_page(page_with("Doc", &[("status", &["draft"])]), &[]);
    let drafts = query(&graph, &[Filter::equals("status", "draft")]).unwrap();
    assert_eq!(names(&drafts), vec!["Doc"]);

    let change = graph.apply_page(page_with("Doc", &[("status", &["active"])]), &[]);
    assert_eq!(change.events(), vec![GraphEvent::updated("Doc")]);
    assert!(query(&graph, &[Filter::equals("status", "draft")]).unwrap().is_empty());
    let active = query(&graph, &[Filter::equals("status", "active")]).unwrap();
    assert_eq!(names(&active), vec!["Doc"]);
}

#[test]
fn cascading_delete_events() {
    let mut graph = Graph::from_pages(vec![record("A", &[], &["B"]), record("B", &[], &[])]);
    let removed = graph.remove_node("A").unwrap();

    assert_eq!(
        removed.events(),
        vec![GraphEvent::deleted("A"), GraphEvent::link_removed("A", "B")]
    );
    assert!(graph.get_backlinks("B").is_empty());
}

#[test]
fn building_twice_is_deterministic() {
    let records = || {
        vec![
            record("A", &[("tag", &["x"])], &["B", "C"]),
            record("B", &[], &["A"]),
        ]
    };
    let first = Graph::from_pages(records());
    let second = Graph::from_pages(records());

    let list = |g: &Graph| {
        g.list_nodes()
            .into_iter()
            .map(|p| (p.name.clone(), p.file_path.clone(), p.metadata.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(list(&first), list(&second));
    assert_eq!(first.all_links(), second.all_links());
}

#[test]
fn queue_carries_page_change_events() {
    let mut graph = Graph::new();
    let queue = EventQueue::new();

    let change = graph.apply_page(PageNode::new("A", "A.md"), &[ParsedLink::new("B")]);
    queue.push_all(change.events());

    assert_eq!(
        queue.poll(),
        vec![GraphEvent::created("A"), GraphEvent::link_created("A", "B")]
    );
}
