//! Element picker installed by the agent
//!
//! Activation adds one `<style>` element carrying the hover outline and
//! one capturing click listener. Deactivation removes exactly those two
//! handles and nothing else.

use crate::bridge::{AgentMessage, Outbox};
use crate::frame::{ClickEvent, Frame, ListenerId};
use crate::renderer::{Document, Node, NodeId, outer_html};
use crate::utils::Result;
use crate::utils::error::RenderError;

/// Stylesheet text injected while inspect mode is on
pub const HOVER_RULE: &str = "*:hover { outline: 2px solid #007acc !important; background-color: rgba(0, 122, 204, 0.1) !important; cursor: pointer !important; }";

/// Handles owned by an active inspector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectorInstall {
    pub style_node: NodeId,
    pub listener: ListenerId,
}

/// Add the hover style and the click interceptor to `frame`
pub fn install(frame: &mut Frame, outbox: Outbox<AgentMessage>) -> Result<InspectorInstall> {
    let document = frame.document();
    let parent = document
        .head()
        .or_else(|| document.document_element())
        .map(|n| n.id)
        .unwrap_or(document.root.id);

    let style = Node::element("style").with_child(Node::text(HOVER_RULE));
    let style_node = frame
        .document_mut()
        .append_child(parent, style)
        .ok_or(RenderError::NodeNotFound(parent))?;

    let listener = frame.listeners_mut().add_click(
        true,
        Box::new(move |document: &Document, event: &mut ClickEvent| {
            event.prevent_default();
            event.stop_propagation();

            let Some(message) = selection(document, event.target) else {
                log::debug!("click on node {} has no element to select", event.target);
                return;
            };
            if let Err(e) = outbox.post(&message) {
                log::debug!("selection not delivered: {}", e);
            }
        }),
    );

    log::debug!("inspector active (style {}, listener {})", style_node, listener);
    Ok(InspectorInstall {
        style_node,
        listener,
    })
}

/// Remove exactly the handles `install` created
pub fn uninstall(frame: &mut Frame, installed: InspectorInstall) {
    if frame.document_mut().remove(installed.style_node).is_none() {
        log::debug!("hover style {} already gone", installed.style_node);
    }
    frame.listeners_mut().remove(installed.listener);
}

fn selection(document: &Document, target: NodeId) -> Option<AgentMessage> {
    let node = document.get(target)?;
    let path = structural_path(document, target)?;
    Some(AgentMessage::ElementSelected {
        html: outer_html(node),
        path,
    })
}

/// XPath-like path identifying `target`
///
/// The nearest ancestor-or-self with a non-empty id anchors the path as
/// `//*[@id="..."]`; otherwise it is rooted at `/html/body` or `/html`.
/// Every other step is `tag[n]`, `n` counting same-tag element siblings
/// before the node, starting at 1.
pub fn structural_path(document: &Document, target: NodeId) -> Option<String> {
    let chain = document.ancestry(target)?;
    chain.last()?.as_element()?;

    let body = document.body().map(|n| n.id);
    let html = document.document_element().map(|n| n.id);
    let mut steps = Vec::new();

    for index in (1..chain.len()).rev() {
        let node = chain[index];
        let element = node.as_element()?;

        let base = if let Some(id) = element.id() {
            Some(format!("//*[@id=\"{}\"]", id))
        } else if Some(node.id) == body {
            Some("/html/body".to_string())
        } else if Some(node.id) == html {
            Some("/html".to_string())
        } else {
            None
        };

        if let Some(base) = base {
            steps.push(base);
            steps.reverse();
            return Some(steps.join("/"));
        }

        let parent = chain[index - 1];
        let position = parent
            .element_children()
            .take_while(|sibling| sibling.id != node.id)
            .filter(|sibling| sibling.tag_name() == node.tag_name())
            .count()
            + 1;
        steps.push(format!("{}[{}]", element.tag_name, position));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::HtmlParser;
    use proptest::prelude::*;

    fn parse(html: &str) -> Document {
        HtmlParser::new().parse(html).unwrap()
    }

    fn by_id(doc: &Document, id: &str) -> NodeId {
        doc.get_element_by_id(id).unwrap().id
    }

    #[test]
    fn test_id_anchors_path() {
        let doc = parse(r#"<div id="wrap"><section><button id="submit-btn">Go</button></section></div>"#);
        assert_eq!(
            structural_path(&doc, by_id(&doc, "submit-btn")).as_deref(),
            Some(r#"//*[@id="submit-btn"]"#)
        );
    }

    #[test]
    fn test_nearest_id_ancestor_prefixes_steps() {
        let doc = parse(r#"<div id="wrap"><p>a</p><span>b</span><p>c</p></div>"#);
        let wrap = doc.get_element_by_id("wrap").unwrap();
        let last_p = wrap.element_children().nth(2).unwrap().id;
        assert_eq!(
            structural_path(&doc, last_p).as_deref(),
            Some(r#"//*[@id="wrap"]/p[2]"#)
        );
    }

    #[test]
    fn test_body_and_html_roots() {
        let doc = parse("<ul><li>a</li><li>b</li></ul>");
        let body = doc.body().unwrap();
        let second = body.element_children().next().unwrap().element_children().nth(1).unwrap().id;
        assert_eq!(structural_path(&doc, second).as_deref(), Some("/html/body/ul[1]/li[2]"));
        assert_eq!(structural_path(&doc, body.id).as_deref(), Some("/html/body"));

        let html = doc.document_element().unwrap().id;
        assert_eq!(structural_path(&doc, html).as_deref(), Some("/html"));
        let head = doc.head().unwrap().id;
        assert_eq!(structural_path(&doc, head).as_deref(), Some("/html/head[1]"));
    }

    #[test]
    fn test_empty_id_is_ignored() {
        let doc = parse(r#"<div id=""><em>x</em></div>"#);
        let em = doc.first_by_tag("em").unwrap().id;
        assert_eq!(structural_path(&doc, em).as_deref(), Some("/html/body/div[1]/em[1]"));
    }

    #[test]
    fn test_text_nodes_have_no_path() {
        let doc = parse("<p>text</p>");
        let text = doc.first_by_tag("p").unwrap().children[0].id;
        assert_eq!(structural_path(&doc, text), None);
        assert_eq!(structural_path(&doc, u64::MAX), None);
    }

    proptest! {
        #[test]
        fn test_sibling_position_counts_same_tag_only(
            before in 0usize..6,
            others in 0usize..4,
        ) {
            let mut html = String::new();
            for i in 0..before {
                html.push_str("<p>x</p>");
                if i < others {
                    html.push_str("<span>y</span>");
                }
            }
            html.push_str("<p>target</p>");
            let doc = parse(&html);
            let target = doc
                .body()
                .unwrap()
                .element_children()
                .filter(|n| n.has_tag("p"))
                .last()
                .unwrap()
                .id;
            let expected = format!("/html/body/p[{}]", before + 1);
            prop_assert_eq!(structural_path(&doc, target), Some(expected));
        }
    }
}
