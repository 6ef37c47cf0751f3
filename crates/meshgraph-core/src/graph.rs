//! Page graph using petgraph::StableDiGraph keyed by page name

use crate::diff::{LinkDiff, PageChange, RemovedPage};
use crate::error::GraphError;
use crate::model::*;
use chrono::{DateTime, Utc};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Node weight. Link targets that have no page yet live as placeholders so
/// their backlinks resolve as soon as the page appears.
#[derive(Debug, Clone)]
enum Slot {
    Page(PageNode),
    Placeholder(String),
}

impl Slot {
    fn name(&self) -> &str {
        match self {
            Slot::Page(page) => &page.name,
            Slot::Placeholder(name) => name,
        }
    }

    fn page(&self) -> Option<&PageNode> {
        match self {
            Slot::Page(page) => Some(page),
            Slot::Placeholder(_) => None,
        }
    }
}

/// The page graph: a directed graph with at most one edge per (from, to).
///
/// Every edge starts at a page. Targets may be placeholders; a placeholder
/// is dropped as soon as nothing links to it.
pub struct Graph {
    inner: StableDiGraph<Slot, WikiLink>,
    index: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("page_count", &self.page_count())
            .field("link_count", &self.link_count())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build a graph from fully parsed pages. Pages go in first so links
    /// between them never pass through a placeholder.
    pub fn from_pages(records: impl IntoIterator<Item = PageRecord>) -> Self {
        let mut graph = Graph::new();
        let mut pending = Vec::new();
        for record in records {
            let PageRecord { page, links } = record;
            let (idx, _) = graph.upsert_index(
                &page.name,
                page.metadata,
                page.file_path,
                page.last_modified,
            );
            pending.push((idx, links));
        }
        for (idx, links) in pending {
            graph.replace_outgoing(idx, &links);
        }
        graph
    }

    fn page_index(&self, name: &str) -> Option<NodeIndex> {
        self.index
            .get(name)
            .copied()
            .filter(|&idx| matches!(self.inner[idx], Slot::Page(_)))
    }

    /// Insert or update a page. Returns true if the page is new.
    ///
    /// Metadata is replaced, not merged.
    pub fn upsert_node(
        &mut self,
        name: &str,
        metadata: Metadata,
        file_path: PathBuf,
        last_modified: DateTime<Utc>,
    ) -> bool {
        self.upsert_index(name, metadata, file_path, last_modified).1
    }

    fn upsert_index(
        &mut self,
        name: &str,
        metadata: Metadata,
        file_path: PathBuf,
        last_modified: DateTime<Utc>,
    ) -> (NodeIndex, bool) {
        let Some(&idx) = self.index.get(name) else {
            let idx = self.inner.add_node(Slot::Page(PageNode {
                name: name.to_string(),
                file_path,
                metadata,
                last_modified,
            }));
            self.index.insert(name.to_string(), idx);
            return (idx, true);
        };

        let slot = &mut self.inner[idx];
        if let Slot::Page(page) = &mut *slot {
            page.file_path = file_path;
            page.metadata = metadata;
            page.last_modified = last_modified;
            return (idx, false);
        }
        *slot = Slot::Page(PageNode {
            name: name.to_string(),
            file_path,
            metadata,
            last_modified,
        });
        (idx, true)
    }

    /// Remove a page and every edge it is an endpoint of.
    ///
    /// If other pages still link to it, their edges go too; the returned
    /// [`RemovedPage`] lists every removed edge so callers can report them.
    pub fn remove_node(&mut self, name: &str) -> Option<RemovedPage> {
        let idx = self.page_index(name)?;

        let mut outgoing: Vec<(String, NodeIndex)> = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (self.inner[e.target()].name().to_string(), e.target()))
            .collect();
        outgoing.sort();
        let mut incoming: Vec<String> = self
            .inner
            .edges_directed(idx, Direction::Incoming)
            .filter(|e| e.source() != idx)
            .map(|e| self.inner[e.source()].name().to_string())
            .collect();
        incoming.sort();

        let page = match self.inner.remove_node(idx) {
            Some(Slot::Page(page)) => page,
            _ => return None,
        };
        self.index.remove(name);

        for (_, target) in &outgoing {
            if *target != idx {
                self.prune_placeholder(*target);
            }
        }

        let removed_links = outgoing
            .into_iter()
            .map(|(to, _)| (name.to_string(), to))
            .chain(incoming.into_iter().map(|from| (from, name.to_string())))
            .collect();

        Some(RemovedPage {
            page,
            removed_links,
        })
    }

    /// Replace the whole outgoing link set of a page.
    ///
    /// Duplicate targets keep the first label. A target whose label changes
    /// is neither added nor removed.
    pub fn set_outgoing_edges(
        &mut self,
        name: &str,
        links: &[ParsedLink],
    ) -> Result<LinkDiff, GraphError> {
        let idx = self
            .page_index(name)
            .ok_or_else(|| GraphError::UnknownPage(name.to_string()))?;
        Ok(self.replace_outgoing(idx, links))
    }

    /// Upsert a page and replace its links in one step.
    pub fn apply_page(
        &mut self,
        page: PageNode,
        links: &[ParsedLink],
    ) -> PageChange {
        let name = page.name.clone();
        let (idx, created) =
            self.upsert_index(&name, page.metadata, page.file_path, page.last_modified);
        let links = self.replace_outgoing(idx, links);
        PageChange {
            name,
            created,
            links,
        }
    }

    fn replace_outgoing(&mut self, idx: NodeIndex, links: &[ParsedLink]) -> LinkDiff {
        let from = self.inner[idx].name().to_string();
        let mut diff = LinkDiff::new(from);

        let mut desired: Vec<&ParsedLink> = Vec::with_capacity(links.len());
        let mut seen = HashSet::new();
        for link in links {
            if seen.insert(link.target.as_str()) {
                desired.push(link);
            }
        }

        let existing: HashMap<String, (EdgeIndex, NodeIndex)> = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| {
                (
                    self.inner[e.target()].name().to_string(),
                    (e.id(), e.target()),
                )
            })
            .collect();

        let mut orphan_candidates = Vec::new();
        for (target, (edge, target_idx)) in &existing {
            if !seen.contains(target.as_str()) {
                self.inner.remove_edge(*edge);
                diff.removed.push(target.clone());
                orphan_candidates.push(*target_idx);
            }
        }

        for link in desired {
            let weight = WikiLink {
                label: link.label.clone(),
            };
            if let Some((edge, _)) = existing.get(&link.target) {
                if let Some(current) = self.inner.edge_weight_mut(*edge) {
                    *current = weight;
                }
                continue;
            }
            let target_idx = self.slot_or_placeholder(&link.target);
            self.inner.add_edge(idx, target_idx, weight);
            diff.added.push(link.target.clone());
        }

        for target in orphan_candidates {
            self.prune_placeholder(target);
        }

        diff.added.sort();
        diff.removed.sort();
        diff
    }

    fn slot_or_placeholder(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.inner.add_node(Slot::Placeholder(name.to_string()));
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Drop a placeholder nothing links to any more.
    fn prune_placeholder(&mut self, idx: NodeIndex) {
        let orphaned = match self.inner.node_weight(idx) {
            Some(Slot::Placeholder(_)) => self
                .inner
                .edges_directed(idx, Direction::Incoming)
                .next()
                .is_none(),
            _ => false,
        };
        if orphaned {
            if let Some(slot) = self.inner.remove_node(idx) {
                self.index.remove(slot.name());
            }
        }
    }

    /// Get a page by name.
    pub fn get_node(&self, name: &str) -> Option<&PageNode> {
        self.index
            .get(name)
            .and_then(|&idx| self.inner.node_weight(idx))
            .and_then(Slot::page)
    }

    /// Check if a page exists. Dangling link targets do not count.
    pub fn node_exists(&self, name: &str) -> bool {
        self.page_index(name).is_some()
    }

    /// All pages, ascending by name.
    pub fn list_nodes(&self) -> Vec<&PageNode> {
        let mut pages: Vec<&PageNode> = self.pages().collect();
        pages.sort_by(|a, b| a.name.cmp(&b.name));
        pages
    }

    /// Iterate over all pages in no particular order.
    pub fn pages(&self) -> impl Iterator<Item = &PageNode> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
            .filter_map(Slot::page)
    }

    /// Names of pages linking to `name`, ascending. Works for dangling targets too.
    pub fn get_backlinks(&self, name: &str) -> Vec<String> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .inner
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.inner[n].name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Names `name` links to, dangling targets included, ascending.
    pub fn get_outlinks(&self, name: &str) -> Vec<String> {
        self.outlinks_detailed(name)
            .into_iter()
            .map(|link| link.target)
            .collect()
    }

    /// Outgoing links with labels and dangling flags, ascending by target.
    pub fn outlinks_detailed(&self, name: &str) -> Vec<LinkInfo> {
        let Some(idx) = self.page_index(name) else {
            return Vec::new();
        };
        let mut links: Vec<LinkInfo> = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| {
                let target = &self.inner[e.target()];
                LinkInfo {
                    target: target.name().to_string(),
                    label: e.weight().label.clone(),
                    dangling: matches!(target, Slot::Placeholder(_)),
                }
            })
            .collect();
        links.sort_by(|a, b| a.target.cmp(&b.target));
        links
    }

    /// Check for an edge `from -> to`.
    pub fn has_link(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.inner.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Every `(from, to)` edge, ascending.
    pub fn all_links(&self) -> Vec<(String, String)> {
        self.collect_links(|_| true)
    }

    /// Edges whose target has no page yet, ascending.
    pub fn dangling_links(&self) -> Vec<(String, String)> {
        self.collect_links(|target| matches!(target, Slot::Placeholder(_)))
    }

    fn collect_links(&self, keep: impl Fn(&Slot) -> bool) -> Vec<(String, String)> {
        let mut links: Vec<(String, String)> = self
            .inner
            .edge_indices()
            .filter_map(|e| self.inner.edge_endpoints(e))
            .filter(|&(_, target)| keep(&self.inner[target]))
            .map(|(source, target)| {
                (
                    self.inner[source].name().to_string(),
                    self.inner[target].name().to_string(),
                )
            })
            .collect();
        links.sort();
        links
    }

    /// Number of pages (placeholders excluded).
    pub fn page_count(&self) -> usize {
        self.pages().count()
    }

    /// Number of links, dangling ones included.
    pub fn link_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.index.clear();
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(name: &str) -> PageNode {
        PageNode::new(name, format!("{name}.md"))
    }

    fn links(targets: &[&str]) -> Vec<ParsedLink> {
        targets.iter().map(|t| ParsedLink::new(*t)).collect()
    }

    #[test]
    fn upsert_creates_then_updates() {
        let mut graph = Graph::new();
        assert!(graph.upsert_node("A", Metadata::new(), "old.md".into(), Utc::now()));

        let mut metadata = Metadata::new();
        metadata.insert("status".into(), vec!["draft".into()]);
        assert!(!graph.upsert_node("A", metadata.clone(), "new.md".into(), Utc::now()));

        let node = graph.get_node("A").unwrap();
        assert_eq!(node.file_path, PathBuf::from("new.md"));
        assert_eq!(node.metadata, metadata);
        assert_eq!(graph.page_count(), 1);
    }

    #[test]
    fn set_outgoing_edges_reports_exact_diff() {
        let mut graph = Graph::new();
        graph.apply_page(page("Test"), &links(&["A", "B"]));

        let diff = graph
            .set_outgoing_edges("Test", &links(&["B", "C"]))
            .unwrap();
        assert_eq!(diff.added, vec!["C"]);
        assert_eq!(diff.removed, vec!["A"]);
        assert_eq!(graph.get_outlinks("Test"), vec!["B", "C"]);

        let diff = graph
            .set_outgoing_edges("Test", &links(&["C", "B"]))
            .unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn set_outgoing_edges_requires_page() {
        let mut graph = Graph::new();
        let err = graph.set_outgoing_edges("Ghost", &links(&["A"]));
        assert!(matches!(err, Err(GraphError::UnknownPage(name)) if name == "Ghost"));
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn label_change_is_not_a_link_change() {
        let mut graph = Graph::new();
        graph.apply_page(page("A"), &[ParsedLink::labeled("B", "old")]);
        let diff = graph
            .set_outgoing_edges("A", &[ParsedLink::labeled("B", "new")])
            .unwrap();
        assert!(diff.is_empty());
        assert_eq!(
            graph.outlinks_detailed("A")[0].label.as_deref(),
            Some("new")
        );
    }

    #[test]
    fn duplicate_targets_keep_first_label() {
        let mut graph = Graph::new();
        let change = graph.apply_page(
            page("A"),
            &[ParsedLink::labeled("B", "first"), ParsedLink::labeled("B", "second")],
        );
        assert_eq!(change.links.added, vec!["B"]);
        assert_eq!(graph.link_count(), 1);
        assert_eq!(
            graph.outlinks_detailed("A")[0].label.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn dangling_target_is_hidden_until_created() {
        let mut graph = Graph::new();
        graph.apply_page(page("A"), &links(&["C"]));

        assert!(!graph.node_exists("C"));
        assert!(graph.get_node("C").is_none());
        assert_eq!(graph.list_nodes().len(), 1);
        assert_eq!(graph.get_outlinks("A"), vec!["C"]);
        assert!(graph.outlinks_detailed("A")[0].dangling);
        assert_eq!(graph.dangling_links(), vec![("A".to_string(), "C".to_string())]);

        let change = graph.apply_page(page("C"), &[]);
        assert!(change.created);
        assert!(graph.node_exists("C"));
        assert_eq!(graph.get_backlinks("C"), vec!["A"]);
        assert!(graph.dangling_links().is_empty());
        assert!(!graph.outlinks_detailed("A")[0].dangling);
    }

    #[test]
    fn unreferenced_placeholder_is_pruned() {
        let mut graph = Graph::new();
        graph.apply_page(page("A"), &links(&["Ghost"]));
        graph.set_outgoing_edges("A", &[]).unwrap();

        assert!(graph.get_backlinks("Ghost").is_empty());
        assert!(graph.index.get("Ghost").is_none());
        assert_eq!(graph.inner.node_count(), 1);
    }

    #[test]
    fn remove_node_cascades_edges() {
        let mut graph = Graph::new();
        graph.apply_page(page("A"), &links(&["B", "Ghost"]));
        graph.apply_page(page("B"), &[]);
        graph.apply_page(page("C"), &links(&["A"]));

        let removed = graph.remove_node("A").unwrap();
        assert_eq!(removed.page.name, "A");
        assert_eq!(
            removed.removed_links,
            vec![
                ("A".to_string(), "B".to_string()),
                ("A".to_string(), "Ghost".to_string()),
                ("C".to_string(), "A".to_string()),
            ]
        );
        assert!(!graph.node_exists("A"));
        assert!(graph.get_backlinks("B").is_empty());
        assert!(graph.get_outlinks("C").is_empty());
        assert_eq!(graph.link_count(), 0);
        assert!(graph.index.get("Ghost").is_none());
    }

    #[test]
    fn remove_node_with_self_link_reports_it_once() {
        let mut graph = Graph::new();
        graph.apply_page(page("Loop"), &links(&["Loop"]));
        let removed = graph.remove_node("Loop").unwrap();
        assert_eq!(
            removed.removed_links,
            vec![("Loop".to_string(), "Loop".to_string())]
        );
        assert_eq!(graph.page_count(), 0);
    }

    #[test]
    fn remove_missing_or_placeholder_is_none() {
        let mut graph = Graph::new();
        assert!(graph.remove_node("Nope").is_none());
        graph.apply_page(page("A"), &links(&["Ghost"]));
        assert!(graph.remove_node("Ghost").is_none());
        assert_eq!(graph.get_outlinks("A"), vec!["Ghost"]);
    }

    #[test]
    fn indices_survive_removal() {
        let mut graph = Graph::new();
        for name in ["First", "Second", "Third"] {
            graph.apply_page(page(name), &[]);
        }
        graph.set_outgoing_edges("Third", &links(&["Second"])).unwrap();
        graph.remove_node("First");

        assert!(graph.node_exists("Second"));
        assert!(graph.node_exists("Third"));
        assert_eq!(graph.get_backlinks("Second"), vec!["Third"]);
    }

    #[test]
    fn from_pages_resolves_links_between_pages() {
        let graph = Graph::from_pages(vec![
            PageRecord {
                page: page("A"),
                links: links(&["B", "Missing"]),
            },
            PageRecord {
                page: page("B"),
                links: links(&["A"]),
            },
        ]);
        assert_eq!(graph.page_count(), 2);
        assert_eq!(graph.link_count(), 3);
        assert_eq!(graph.get_backlinks("A"), vec!["B"]);
        assert_eq!(
            graph.dangling_links(),
            vec![("A".to_string(), "Missing".to_string())]
        );
    }

    #[test]
    fn clear_empties_everything() {
        let mut graph = Graph::new();
        graph.apply_page(page("A"), &links(&["B"]));
        graph.clear();
        assert_eq!(graph.page_count(), 0);
        assert_eq!(graph.link_count(), 0);
        assert!(!graph.has_link("A", "B"));
    }
}
