pub mod document;
pub mod node;
pub mod parser;

pub use document::{Document, Link};
pub use node::{Descendants, ElementFilter, HtmlTree, NodeId, NodeRef};
pub use parser::{detect_charset, parse_bytes, parse_html};
