//! HTML5 parser implementation using html5ever

use super::dom::{Document, ElementData, Node, NodeType};
use crate::utils::Result;
use crate::utils::error::RenderError;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// HTML5 parser using html5ever
pub struct HtmlParser {
    opts: ParseOpts,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self {
            opts: ParseOpts {
                tree_builder: TreeBuilderOpts {
                    drop_doctype: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    /// Parse HTML content into a DOM document
    ///
    /// html5ever always produces `html`, `head` and `body`, so any input,
    /// including the empty string, yields a complete skeleton.
    pub fn parse(&self, content: &str) -> Result<Document> {
        let dom = parse_document(RcDom::default(), self.opts.clone())
            .from_utf8()
            .read_from(&mut content.as_bytes())
            .map_err(|e| RenderError::HtmlParse(e.to_string()))?;

        let mut document = Document::new();
        for child in dom.document.children.borrow().iter() {
            if let Some(node) = convert(child) {
                document.root.add_child(node);
            }
        }
        Ok(document)
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an rcdom subtree, building children before attaching them
fn convert(handle: &Handle) -> Option<Node> {
    let mut open = vec![(shallow(handle)?, child_handles(handle))];
    loop {
        let (_, remaining) = open.last_mut()?;
        match remaining.next() {
            Some(child) => {
                if let Some(node) = shallow(&child) {
                    open.push((node, child_handles(&child)));
                }
            }
            None => {
                let (done, _) = open.pop()?;
                match open.last_mut() {
                    Some((parent, _)) => {
                        parent.add_child(done);
                    }
                    None => return Some(done),
                }
            }
        }
    }
}

fn child_handles(handle: &Handle) -> std::vec::IntoIter<Handle> {
    handle.children.borrow().clone().into_iter()
}

/// The node for `handle` without its children
fn shallow(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let mut data = ElementData::new(name.local.as_ref());
            for attr in attrs.borrow().iter() {
                data.set_attribute(attr.name.local.as_ref(), attr.value.as_ref());
            }
            Some(Node::new(NodeType::Element(data)))
        }
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            if text.trim().is_empty() {
                None
            } else {
                Some(Node::text(text))
            }
        }
        NodeData::Comment { contents } => Some(Node::new(NodeType::Comment(contents.to_string()))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_html() {
        let parser = HtmlParser::new();
        let doc = parser.parse("").unwrap();
        assert!(doc.head().is_some());
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_parse_simple_html() {
        let parser = HtmlParser::new();
        let doc = parser.parse("<html><body>Hello</body></html>").unwrap();
        assert_eq!(doc.body().unwrap().text_content(), "Hello");
    }

    #[test]
    fn test_parse_with_attributes() {
        let parser = HtmlParser::new();
        let doc = parser
            .parse(r#"<div id="main" class="container" data-x="1">Content</div>"#)
            .unwrap();
        let div = doc.get_element_by_id("main").unwrap();
        let attrs: Vec<_> = div
            .as_element()
            .unwrap()
            .attributes
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(attrs, vec!["id", "class", "data-x"]);
    }

    #[test]
    fn test_parse_nested_elements() {
        let parser = HtmlParser::new();
        let doc = parser
            .parse(
                r#"
            <html>
                <head><title>Test</title></head>
                <body>
                    <div>
                        <p>Paragraph 1</p>
                        <p>Paragraph 2</p>
                    </div>
                </body>
            </html>
        "#,
            )
            .unwrap();
        assert_eq!(doc.title(), "Test");
        let div = doc.first_by_tag("div").unwrap();
        assert_eq!(div.element_children().count(), 2);
        assert_eq!(div.children.len(), 2, "whitespace-only text is dropped");
    }

    #[test]
    fn test_parse_malformed_html() {
        // html5ever should handle malformed HTML gracefully
        let parser = HtmlParser::new();
        let doc = parser.parse("<p>Unclosed paragraph<div>Another").unwrap();
        assert!(doc.first_by_tag("p").is_some());
        assert!(doc.first_by_tag("div").is_some());
    }

    #[test]
    fn test_parse_deeply_nested() {
        let depth = 10_000;
        let html = format!("{}x", "<div>".repeat(depth));
        let doc = HtmlParser::new().parse(&html).unwrap();
        assert_eq!(doc.element_count(), depth + 3);
        let (deepest, node) = doc.elements().into_iter().last().unwrap();
        assert_eq!(deepest, depth + 1);
        assert_eq!(node.text_content(), "x");
    }

    #[test]
    fn test_inline_scripts() {
        let parser = HtmlParser::new();
        let doc = parser
            .parse(r#"<script>var a = 1;</script><script src="x.js"></script><script>var b = 2;</script>"#)
            .unwrap();
        assert_eq!(doc.inline_scripts(), vec!["var a = 1;", "var b = 2;"]);
    }
}
