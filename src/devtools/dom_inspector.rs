//! Elements panel: flat DOM tree view and element selection

use crate::bridge::SelectionEvent;
use crate::renderer::{Document, NodeId};

/// One row of the simplified element tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomTreeRow {
    pub node: NodeId,
    pub tag_name: String,
    /// Nesting depth below `<html>`, used for indentation only
    pub depth: usize,
}

impl DomTreeRow {
    /// `<tag>` indented two spaces per level
    pub fn render(&self) -> String {
        format!("{}<{}>", "  ".repeat(self.depth), self.tag_name)
    }
}

/// Label of the inspect button while idle
pub const INSPECT_LABEL: &str = "Inspect";
/// Label of the inspect button while picking
pub const STOP_INSPECT_LABEL: &str = "Stop Inspect";

/// DOM Inspector state on the Host side
pub struct DomInspector {
    rows: Vec<DomTreeRow>,
    selected: Option<SelectionEvent>,
    inspecting: bool,
    limit: usize,
}

impl DomInspector {
    /// Create an inspector listing at most `limit` elements after the root
    pub fn new(limit: usize) -> Self {
        Self {
            rows: Vec::new(),
            selected: None,
            inspecting: false,
            limit,
        }
    }

    /// Rebuild the rows: `<html>` first, then up to `limit` elements in document order
    pub fn set_tree(&mut self, document: &Document) {
        self.rows = document
            .elements()
            .into_iter()
            .take(self.limit + 1)
            .filter_map(|(depth, node)| {
                node.tag_name().map(|tag| DomTreeRow {
                    node: node.id,
                    tag_name: tag.to_string(),
                    depth,
                })
            })
            .collect();
        log::debug!("element tree refreshed ({} rows)", self.rows.len());
    }

    pub fn rows(&self) -> &[DomTreeRow] {
        &self.rows
    }

    /// Rendered rows
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(DomTreeRow::render).collect()
    }

    /// Store a picked element
    pub fn select(&mut self, selection: SelectionEvent) {
        self.selected = Some(selection);
    }

    /// Get selected element
    pub fn selected(&self) -> Option<&SelectionEvent> {
        self.selected.as_ref()
    }

    pub fn is_inspecting(&self) -> bool {
        self.inspecting
    }

    pub fn set_inspecting(&mut self, inspecting: bool) {
        self.inspecting = inspecting;
    }

    /// Text of the inspect button
    pub fn button_label(&self) -> &'static str {
        if self.inspecting {
            STOP_INSPECT_LABEL
        } else {
            INSPECT_LABEL
        }
    }

    /// Forget everything tied to the current document
    pub fn reset(&mut self) {
        self.rows.clear();
        self.selected = None;
        self.inspecting = false;
    }
}

impl Default for DomInspector {
    fn default() -> Self {
        Self::new(100)
    }
}
