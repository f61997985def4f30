//! DOM (Document Object Model) implementation

use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a node, unique for the lifetime of the process
pub type NodeId = u64;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn allocate_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Node types in the DOM
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    /// Document root
    Document,
    /// Element node (e.g., <div>)
    Element(ElementData),
    /// Text node
    Text(String),
    /// Comment node
    Comment(String),
}

/// Data for element nodes
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase tag name (e.g., "div", "span")
    pub tag_name: String,
    /// Element attributes in source order
    pub attributes: Vec<(String, String)>,
}

impl ElementData {
    /// Create a new element
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute value, keeping the position of an existing one
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// The `id` attribute, if present and non-empty
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id").filter(|id| !id.is_empty())
    }

    /// Get class names
    pub fn classes(&self) -> Vec<&str> {
        self.get_attribute("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// A node in the DOM tree
#[derive(Debug)]
pub struct Node {
    /// Node identity
    pub id: NodeId,
    /// Node type and data
    pub node_type: NodeType,
    /// Child nodes
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new node
    pub fn new(node_type: NodeType) -> Self {
        Self {
            id: allocate_node_id(),
            node_type,
            children: Vec::new(),
        }
    }

    /// Create an element node
    pub fn element(tag_name: impl Into<String>) -> Self {
        Self::new(NodeType::Element(ElementData::new(tag_name)))
    }

    /// Create an element node with attributes
    pub fn element_with_attrs(tag_name: impl Into<String>, attrs: &[(&str, &str)]) -> Self {
        let mut data = ElementData::new(tag_name);
        for (k, v) in attrs {
            data.set_attribute(*k, *v);
        }
        Self::new(NodeType::Element(data))
    }

    /// Create a text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeType::Text(content.into()))
    }

    /// Add a child node, returning its id
    pub fn add_child(&mut self, child: Node) -> NodeId {
        let id = child.id;
        self.children.push(child);
        id
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element(_))
    }

    /// Get element data if this is an element
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Tag name for elements
    pub fn tag_name(&self) -> Option<&str> {
        self.as_element().map(|e| e.tag_name.as_str())
    }

    /// Whether this is an element with the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_name()
            .map(|t| t.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for (_, node) in self.walk() {
            if let NodeType::Text(t) = &node.node_type {
                out.push_str(t);
            }
        }
        out
    }

    /// Element children only
    pub fn element_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|c| c.is_element())
    }

    /// This node and every descendant in document order, with their
    /// distance from this node
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }

    fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter_mut());
        }
        None
    }

    fn remove_descendant(&mut self, id: NodeId) -> Option<Node> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Some(pos) = node.children.iter().position(|c| c.id == id) {
                return Some(node.children.remove(pos));
            }
            stack.extend(node.children.iter_mut());
        }
        None
    }
}

impl Drop for Node {
    // Flatten the subtree first; a nested drop recurses once per level
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Depth-first walk over a subtree, see [`Node::walk`]
pub struct Walk<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

/// The DOM document
#[derive(Debug)]
pub struct Document {
    /// Root node
    pub root: Node,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            root: Node::new(NodeType::Document),
        }
    }

    /// The `<html>` element (first element child of the root)
    pub fn document_element(&self) -> Option<&Node> {
        self.root.element_children().next()
    }

    /// The `<head>` element
    pub fn head(&self) -> Option<&Node> {
        self.document_element()?
            .element_children()
            .find(|c| c.has_tag("head"))
    }

    /// The `<body>` element
    pub fn body(&self) -> Option<&Node> {
        self.document_element()?
            .element_children()
            .find(|c| c.has_tag("body"))
    }

    /// Document title text
    pub fn title(&self) -> String {
        self.first_by_tag("title")
            .map(|t| t.text_content().trim().to_string())
            .unwrap_or_default()
    }

    /// Find a node by id
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.root.walk().map(|(_, n)| n).find(|n| n.id == id)
    }

    /// Find a node by id, mutably
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.root.find_mut(id)
    }

    /// First element carrying the given `id` attribute
    pub fn get_element_by_id(&self, element_id: &str) -> Option<&Node> {
        self.elements()
            .into_iter()
            .map(|(_, n)| n)
            .find(|n| n.as_element().and_then(|e| e.id()) == Some(element_id))
    }

    /// First element with the given tag name
    pub fn first_by_tag(&self, tag: &str) -> Option<&Node> {
        self.root.walk().map(|(_, n)| n).find(|n| n.has_tag(tag))
    }

    /// Nodes from the document root down to `id`, inclusive
    pub fn ancestry(&self, id: NodeId) -> Option<Vec<&Node>> {
        // In document order every node still on `chain` above `depth` is an ancestor
        let mut chain = Vec::new();
        for (depth, node) in self.root.walk() {
            chain.truncate(depth);
            chain.push(node);
            if node.id == id {
                return Some(chain);
            }
        }
        None
    }

    /// Append `child` under `parent`, returning the child's id
    pub fn append_child(&mut self, parent: NodeId, child: Node) -> Option<NodeId> {
        self.get_mut(parent).map(|p| p.add_child(child))
    }

    /// Detach a node from the tree
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.root.remove_descendant(id)
    }

    /// All elements in document order with their depth (document element = 0)
    pub fn elements(&self) -> Vec<(usize, &Node)> {
        self.root
            .walk()
            .filter(|(_, n)| n.is_element())
            .map(|(depth, n)| (depth.saturating_sub(1), n))
            .collect()
    }

    /// Source of inline `<script>` elements in document order
    pub fn inline_scripts(&self) -> Vec<String> {
        self.elements()
            .into_iter()
            .map(|(_, n)| n)
            .filter(|n| n.has_tag("script"))
            .filter(|n| n.as_element().and_then(|e| e.get_attribute("src")).is_none())
            .map(|n| n.text_content())
            .filter(|src| !src.trim().is_empty())
            .collect()
    }

    /// Number of elements in the document
    pub fn element_count(&self) -> usize {
        self.elements().len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let p = Node::element("p").with_child(Node::text("hello"));
        let p_id = p.id;
        let body = Node::element("body").with_child(p);
        let body_id = body.id;
        let html = Node::element("html")
            .with_child(Node::element("head").with_child(Node::element("title").with_child(Node::text(" Demo "))))
            .with_child(body);
        doc.root.add_child(html);
        (doc, body_id, p_id)
    }

    #[test]
    fn test_structure_accessors() {
        let (doc, body_id, _) = sample();
        assert_eq!(doc.document_element().and_then(|n| n.tag_name()), Some("html"));
        assert_eq!(doc.body().map(|b| b.id), Some(body_id));
        assert!(doc.head().is_some());
        assert_eq!(doc.title(), "Demo");
    }

    #[test]
    fn test_ancestry() {
        let (doc, body_id, p_id) = sample();
        let chain = doc.ancestry(p_id).unwrap();
        let tags: Vec<_> = chain.iter().filter_map(|n| n.tag_name()).collect();
        assert_eq!(tags, vec!["html", "body", "p"]);
        assert_eq!(chain[chain.len() - 2].id, body_id);
        assert!(doc.ancestry(u64::MAX).is_none());
    }

    #[test]
    fn test_append_and_remove() {
        let (mut doc, body_id, _) = sample();
        let before = doc.element_count();
        let span = doc.append_child(body_id, Node::element("span")).unwrap();
        assert_eq!(doc.element_count(), before + 1);
        let removed = doc.remove(span).unwrap();
        assert_eq!(removed.tag_name(), Some("span"));
        assert_eq!(doc.element_count(), before);
        assert!(doc.remove(span).is_none());
    }

    #[test]
    fn test_elements_depth() {
        let (doc, _, _) = sample();
        let rows: Vec<_> = doc
            .elements()
            .into_iter()
            .map(|(d, n)| (d, n.tag_name().unwrap().to_string()))
            .collect();
        assert_eq!(rows[0], (0, "html".to_string()));
        assert_eq!(rows[1], (1, "head".to_string()));
        assert_eq!(rows[2], (2, "title".to_string()));
        assert_eq!(rows[3], (1, "body".to_string()));
        assert_eq!(rows[4], (2, "p".to_string()));
    }

    #[test]
    fn test_empty_id_is_no_id() {
        let node = Node::element_with_attrs("div", &[("id", "")]);
        assert_eq!(node.as_element().unwrap().id(), None);
        let node = Node::element_with_attrs("div", &[("id", "main"), ("class", "a b")]);
        assert_eq!(node.as_element().unwrap().id(), Some("main"));
        assert_eq!(node.as_element().unwrap().classes(), vec!["a", "b"]);
    }

    #[test]
    fn test_set_attribute_keeps_order() {
        let mut data = ElementData::new("A");
        data.set_attribute("href", "/x");
        data.set_attribute("id", "link");
        data.set_attribute("href", "/y");
        assert_eq!(data.tag_name, "a");
        assert_eq!(
            data.attributes,
            vec![("href".to_string(), "/y".to_string()), ("id".to_string(), "link".to_string())]
        );
    }
}
