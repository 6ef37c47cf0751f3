//! Change notifications and the bounded queue they are buffered in

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Maximum number of buffered events before the oldest are evicted.
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

/// A semantic change to the page graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphEvent {
    PageCreated { name: String },
    PageUpdated { name: String },
    PageDeleted { name: String },
    LinkCreated { from: String, to: String },
    LinkRemoved { from: String, to: String },
}

impl GraphEvent {
    pub fn created(name: impl Into<String>) -> Self {
        GraphEvent::PageCreated { name: name.into() }
    }

    pub fn updated(name: impl Into<String>) -> Self {
        GraphEvent::PageUpdated { name: name.into() }
    }

    pub fn deleted(name: impl Into<String>) -> Self {
        GraphEvent::PageDeleted { name: name.into() }
    }

    pub fn link_created(from: impl Into<String>, to: impl Into<String>) -> Self {
        GraphEvent::LinkCreated {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn link_removed(from: impl Into<String>, to: impl Into<String>) -> Self {
        GraphEvent::LinkRemoved {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Stable wire name of the event kind.
    pub fn event_type(&self) -> &'static str {
        match self {
            GraphEvent::PageCreated { .. } => "page_created",
            GraphEvent::PageUpdated { .. } => "page_updated",
            GraphEvent::PageDeleted { .. } => "page_deleted",
            GraphEvent::LinkCreated { .. } => "link_created",
            GraphEvent::LinkRemoved { .. } => "link_removed",
        }
    }

    /// Page name for page events.
    pub fn page_name(&self) -> Option<&str> {
        match self {
            GraphEvent::PageCreated { name }
            | GraphEvent::PageUpdated { name }
            | GraphEvent::PageDeleted { name } => Some(name),
            _ => None,
        }
    }

    /// `(from, to)` for link events.
    pub fn link(&self) -> Option<(&str, &str)> {
        match self {
            GraphEvent::LinkCreated { from, to } | GraphEvent::LinkRemoved { from, to } => {
                Some((from, to))
            }
            _ => None,
        }
    }
}

impl fmt::Display for GraphEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.link() {
            Some((from, to)) => write!(f, "{} {} -> {}", self.event_type(), from, to),
            None => write!(f, "{} {}", self.event_type(), self.page_name().unwrap_or_default()),
        }
    }
}

struct QueueState {
    events: VecDeque<GraphEvent>,
    dropped: u64,
}

/// Thread-safe, bounded buffer of graph events.
///
/// Cloning yields another handle to the same buffer. Meant for a single
/// consumer: two concurrent pollers each get an arbitrary share of the stream.
#[derive(Clone)]
pub struct EventQueue {
    state: Arc<Mutex<QueueState>>,
    capacity: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        EventQueue {
            state: Arc::new(Mutex::new(QueueState {
                events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
                dropped: 0,
            })),
            capacity,
        }
    }

    pub fn push(&self, event: GraphEvent) {
        self.push_all(std::iter::once(event));
    }

    /// Append events in order, evicting the oldest once over capacity.
    pub fn push_all(&self, events: impl IntoIterator<Item = GraphEvent>) {
        let mut state = self.state.lock();
        let mut evicted = 0u64;
        for event in events {
            if state.events.len() == self.capacity {
                state.events.pop_front();
                evicted += 1;
            }
            state.events.push_back(event);
        }
        if evicted > 0 {
            state.dropped += evicted;
            tracing::warn!(
                "Event queue full ({} entries), dropped {} oldest events",
                self.capacity,
                evicted
            );
        }
    }

    /// Atomically take every buffered event.
    pub fn poll(&self) -> Vec<GraphEvent> {
        self.state.lock().events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total events evicted since the queue was created.
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("EventQueue")
            .field("len", &state.events.len())
            .field("capacity", &self.capacity)
            .field("dropped", &state.dropped)
            .finish()
    }
}
