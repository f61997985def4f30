//! Markup serialization and the page-source formatter

use super::dom::{Node, NodeType};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Deepest indentation the source formatter emits
pub const MAX_INDENT_LEVELS: usize = 64;

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Whether `tag` never has children or a closing tag
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

/// Serialize a node the way `outerHTML` does
pub fn outer_html(node: &Node) -> String {
    let mut out = String::new();
    write_markup(vec![Step::Open(node, false)], &mut out);
    out
}

/// Serialize the children of a node the way `innerHTML` does
pub fn inner_html(node: &Node) -> String {
    let mut out = String::new();
    write_markup(children_of(node), &mut out);
    out
}

enum Step<'a> {
    /// Write a node; the flag marks text inside a raw-text element
    Open(&'a Node, bool),
    Close(&'a str),
}

/// Child steps of `node`, reversed for popping off a stack
fn children_of(node: &Node) -> Vec<Step<'_>> {
    let raw = node
        .tag_name()
        .map(|t| RAW_TEXT_ELEMENTS.contains(&t))
        .unwrap_or(false);
    node.children
        .iter()
        .rev()
        .map(|child| Step::Open(child, raw))
        .collect()
}

fn write_markup(mut stack: Vec<Step<'_>>, out: &mut String) {
    while let Some(step) = stack.pop() {
        let (node, raw_parent) = match step {
            Step::Close(tag) => {
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
                continue;
            }
            Step::Open(node, raw_parent) => (node, raw_parent),
        };

        match &node.node_type {
            NodeType::Document => stack.extend(children_of(node)),
            NodeType::Element(data) => {
                out.push('<');
                out.push_str(&data.tag_name);
                for (name, value) in &data.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if !is_void_element(&data.tag_name) {
                    stack.push(Step::Close(&data.tag_name));
                    stack.extend(children_of(node));
                }
            }
            NodeType::Text(text) => {
                if raw_parent {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            NodeType::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Naive pretty-printer used by the Sources panel
///
/// Splits the markup between adjacent tags, indents by two spaces per
/// open element and drops bare `html`/`head`/`body` tags entirely.
/// Indentation stops growing past [`MAX_INDENT_LEVELS`].
pub fn format_html(html: &str) -> String {
    const TAB: &str = "  ";
    let trimmed = html.trim();
    let inner = trimmed.strip_prefix('<').unwrap_or(trimmed);
    let inner = inner.strip_suffix('>').unwrap_or(inner);

    let mut lines: Vec<String> = Vec::new();
    let mut level: usize = 0;

    for segment in split_between_tags(inner) {
        if is_bare_document_tag(segment) {
            continue;
        }
        if is_closing_segment(segment) {
            level = level.saturating_sub(1);
        }
        lines.push(format!("{}<{}>", TAB.repeat(level.min(MAX_INDENT_LEVELS)), segment));
        if is_opening_segment(segment) {
            level += 1;
        }
    }

    lines.join("\n").trim().to_string()
}

/// Split on `>` followed by optional whitespace and `<`
fn split_between_tags(input: &str) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'>' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'<' {
                segments.push(&input[start..i]);
                start = j + 1;
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    segments.push(&input[start..]);
    segments
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_closing_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars.next() == Some('/') && chars.next().map(is_word_char).unwrap_or(false)
}

fn is_opening_segment(segment: &str) -> bool {
    let Some(first) = segment.chars().next() else {
        return false;
    };
    if !is_word_char(first) || segment.ends_with('/') {
        return false;
    }
    let body = &segment[..segment.len() - segment.chars().last().map(char::len_utf8).unwrap_or(0)];
    if body.contains('>') {
        return false;
    }
    let tag: String = segment.chars().take_while(|c| is_word_char(*c) || *c == '-').collect();
    !is_void_element(&tag)
}

fn is_bare_document_tag(segment: &str) -> bool {
    matches!(
        segment,
        "html" | "/html" | "head" | "/head" | "body" | "/body"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::HtmlParser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_outer_html_round_trip_shape() {
        let doc = HtmlParser::new()
            .parse(r#"<button id="submit-btn" class="primary">Send &amp; go</button>"#)
            .unwrap();
        let button = doc.get_element_by_id("submit-btn").unwrap();
        assert_eq!(
            outer_html(button),
            r#"<button id="submit-btn" class="primary">Send &amp; go</button>"#
        );
    }

    #[test]
    fn test_void_and_raw_text() {
        let doc = HtmlParser::new()
            .parse("<div><img src=\"a.png\" alt='x\"y'><br><script>if (a < b) {}</script></div>")
            .unwrap();
        let div = doc.first_by_tag("div").unwrap();
        assert_eq!(
            outer_html(div),
            "<div><img src=\"a.png\" alt=\"x&quot;y\"><br><script>if (a < b) {}</script></div>"
        );
    }

    #[test]
    fn test_comment_serialization() {
        let node = Node::element("p").with_child(Node::new(NodeType::Comment(" note ".into())));
        assert_eq!(outer_html(&node), "<p><!-- note --></p>");
    }

    #[test]
    fn test_format_html() {
        let source = "<html><head><title>T</title></head><body><div><p>a</p><br></div></body></html>";
        let expected = ["<title>T</title>", "<div>", "  <p>a</p>", "  <br>", "</div>"].join("\n");
        assert_eq!(format_html(source), expected);
    }

    #[test]
    fn test_deep_nesting_serializes() {
        let depth = 10_000;
        let source = format!("{}x", "<section>".repeat(depth));
        let doc = HtmlParser::new().parse(&source).unwrap();
        let body = doc.body().unwrap();
        let expected = format!(
            "{}x{}",
            "<section>".repeat(depth),
            "</section>".repeat(depth)
        );
        assert_eq!(inner_html(body), expected);

        let formatted = format_html(&outer_html(doc.document_element().unwrap()));
        let widest = formatted
            .lines()
            .map(|l| l.len() - l.trim_start().len())
            .max()
            .unwrap();
        assert_eq!(widest, MAX_INDENT_LEVELS * 2);
    }

    #[test]
    fn test_split_between_tags() {
        assert_eq!(split_between_tags("a>  <b>\n<c"), vec!["a", "b", "c"]);
        assert_eq!(split_between_tags("a > b"), vec!["a > b"]);
    }
}
