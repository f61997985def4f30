//! Document model for embedded frames
//!
//! Handles HTML parsing into a DOM tree, markup serialization and the
//! source formatter used by the Sources panel.

mod dom;
pub mod html;
pub mod serialize;

pub use dom::{Document, ElementData, Node, NodeId, NodeType};
pub use html::HtmlParser;
pub use serialize::{MAX_INDENT_LEVELS, format_html, inner_html, outer_html};
