//! Event listener registry for a loaded document

use crate::renderer::{Document, NodeId};

/// Handle returned on registration; removal goes through this exact handle
pub type ListenerId = u64;

/// A click travelling through the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: NodeId,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl ClickEvent {
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Click handler; receives the document the click happened in
pub type ClickHandler = Box<dyn FnMut(&Document, &mut ClickEvent)>;

struct Registered {
    id: ListenerId,
    capture: bool,
    handler: ClickHandler,
}

/// Document-level click listeners
#[derive(Default)]
pub struct EventListeners {
    next_id: ListenerId,
    click: Vec<Registered>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a click listener
    pub fn add_click(&mut self, capture: bool, handler: ClickHandler) -> ListenerId {
        self.next_id += 1;
        let id = self.next_id;
        self.click.push(Registered {
            id,
            capture,
            handler,
        });
        id
    }

    /// Remove the listener registered under `id`
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.click.len();
        self.click.retain(|r| r.id != id);
        self.click.len() != before
    }

    /// Run capturing listeners, then bubbling ones unless propagation stopped
    pub fn dispatch(&mut self, document: &Document, event: &mut ClickEvent) {
        for phase_capture in [true, false] {
            for registered in self.click.iter_mut().filter(|r| r.capture == phase_capture) {
                (registered.handler)(document, event);
            }
            if event.propagation_stopped() {
                return;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.click.len()
    }

    pub fn is_empty(&self) -> bool {
        self.click.is_empty()
    }
}
