//! Capability interface for code that may or may not have an engine

use crate::engine::Engine;
use crate::error::Result;
use meshgraph_core::{Filter, GraphEvent, MetaTable, Metadata, PageNode};

/// Everything an embedding application needs from the page graph.
///
/// Implemented by [`Engine`] and by [`NoopGraph`], so callers can hold a
/// `Box<dyn GraphProvider>` and never check whether graph support is on.
pub trait GraphProvider: Send + Sync {
    fn list_pages(&self) -> Vec<PageNode>;
    fn get_page(&self, name: &str) -> Option<PageNode>;
    fn page_exists(&self, name: &str) -> bool;
    fn get_backlinks(&self, name: &str) -> Vec<String>;
    fn get_outlinks(&self, name: &str) -> Vec<String>;
    fn get_metadata(&self, name: &str) -> Option<Metadata>;
    fn query(&self, filters: &[Filter]) -> Result<Vec<PageNode>>;
    fn metatable(&self, filters: &[Filter], columns: &[String]) -> Result<MetaTable>;
    fn poll_events(&self) -> Vec<GraphEvent>;

    /// False only for the no-op provider.
    fn is_available(&self) -> bool {
        true
    }
}

impl GraphProvider for Engine {
    fn list_pages(&self) -> Vec<PageNode> {
        Engine::list_pages(self)
    }

    fn get_page(&self, name: &str) -> Option<PageNode> {
        Engine::get_page(self, name)
    }

    fn page_exists(&self, name: &str) -> bool {
        Engine::page_exists(self, name)
    }

    fn get_backlinks(&self, name: &str) -> Vec<String> {
        Engine::get_backlinks(self, name)
    }

    fn get_outlinks(&self, name: &str) -> Vec<String> {
        Engine::get_outlinks(self, name)
    }

    fn get_metadata(&self, name: &str) -> Option<Metadata> {
        Engine::get_metadata(self, name)
    }

    fn query(&self, filters: &[Filter]) -> Result<Vec<PageNode>> {
        Engine::query(self, filters)
    }

    fn metatable(&self, filters: &[Filter], columns: &[String]) -> Result<MetaTable> {
        Engine::metatable(self, filters, columns)
    }

    fn poll_events(&self) -> Vec<GraphEvent> {
        Engine::poll_events(self)
    }
}

/// Stand-in used when graph support is disabled: no pages, no events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGraph;

impl GraphProvider for NoopGraph {
    fn list_pages(&self) -> Vec<PageNode> {
        Vec::new()
    }

    fn get_page(&self, _name: &str) -> Option<PageNode> {
        None
    }

    fn page_exists(&self, _name: &str) -> bool {
        false
    }

    fn get_backlinks(&self, _name: &str) -> Vec<String> {
        Vec::new()
    }

    fn get_outlinks(&self, _name: &str) -> Vec<String> {
        Vec::new()
    }

    fn get_metadata(&self, _name: &str) -> Option<Metadata> {
        None
    }

    fn query(&self, _filters: &[Filter]) -> Result<Vec<PageNode>> {
        Ok(Vec::new())
    }

    fn metatable(&self, _filters: &[Filter], columns: &[String]) -> Result<MetaTable> {
        Ok(MetaTable {
            columns: columns.to_vec(),
            rows: Vec::new(),
        })
    }

    fn poll_events(&self) -> Vec<GraphEvent> {
        Vec::new()
    }

    fn is_available(&self) -> bool {
        false
    }
}
