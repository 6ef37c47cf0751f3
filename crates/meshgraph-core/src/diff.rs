//! Change sets produced by graph mutations, and their event translation

use crate::event::GraphEvent;
use crate::model::PageNode;

/// Exact difference between a page's old and new outgoing link sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDiff {
    pub from: String,
    /// Targets linked now but not before, ascending.
    pub added: Vec<String>,
    /// Targets linked before but not now, ascending.
    pub removed: Vec<String>,
}

impl LinkDiff {
    pub fn new(from: impl Into<String>) -> Self {
        LinkDiff {
            from: from.into(),
            added: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// One `LinkRemoved` per removed target, then one `LinkCreated` per added target.
    pub fn events(&self) -> Vec<GraphEvent> {
        self.removed
            .iter()
            .map(|to| GraphEvent::link_removed(&self.from, to))
            .chain(
                self.added
                    .iter()
                    .map(|to| GraphEvent::link_created(&self.from, to)),
            )
            .collect()
    }
}

/// Result of writing a parsed page into the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageChange {
    pub name: String,
    /// True if the page did not exist before.
    pub created: bool,
    pub links: LinkDiff,
}

impl PageChange {
    /// Exactly one page event followed by the link events.
    pub fn events(&self) -> Vec<GraphEvent> {
        let page_event = if self.created {
            GraphEvent::created(&self.name)
        } else {
            GraphEvent::updated(&self.name)
        };
        std::iter::once(page_event)
            .chain(self.links.events())
            .collect()
    }
}

/// A page removed from the graph together with every edge it took along.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedPage {
    pub page: PageNode,
    /// `(from, to)` pairs: outgoing edges first, then incoming, each ascending.
    pub removed_links: Vec<(String, String)>,
}

impl RemovedPage {
    pub fn events(&self) -> Vec<GraphEvent> {
        std::iter::once(GraphEvent::deleted(&self.page.name))
            .chain(
                self.removed_links
                    .iter()
                    .map(|(from, to)| GraphEvent::link_removed(from, to)),
            )
            .collect()
    }
}
