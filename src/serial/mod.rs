//! Node serialization.
//!
//! HTML and XML documents use different output methods. Neither writes
//! the tail text that follows a node, and neither pretty-prints.

pub mod html;
pub mod xml;

pub use html::{node_to_html, serialize_html};
pub use xml::{node_to_xml, serialize_xml};
