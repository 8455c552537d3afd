//! # seloxide
//!
//! Query HTML, XML, JSON and plain text documents with CSS selectors,
//! `XPath` 1.0 and JMESPath through one result type.
//!
//! A [`Selection`] is built from text or bytes; its [`Kind`] is inferred
//! (JSON when the text parses as JSON, HTML otherwise) or given
//! explicitly. Every query returns a [`SelectionList`] of new selections
//! that can be queried again, serialized or matched with regular
//! expressions.
//!
//! ## Quick Start
//!
//! ```
//! use seloxide::Selection;
//!
//! let sel = Selection::new(r#"<ul><li class="x">1</li><li>2</li></ul>"#);
//! assert_eq!(sel.css("li::text").unwrap().getall(), ["1", "2"]);
//! assert_eq!(sel.css("li.x::text").unwrap().get().as_deref(), Some("1"));
//! assert_eq!(
//!     sel.xpath("//li[has-class('x')]").unwrap().getall(),
//!     [r#"<li class="x">1</li>"#]
//! );
//!
//! let json = Selection::new(r#"{"html": "<b>bold</b>"}"#);
//! let inner = json.jmespath("html").unwrap();
//! assert_eq!(inner.css("b::text").unwrap().getall(), ["bold"]);
//! ```
//!
//! ## Modules
//!
//! - [`selector`]: selections, lists and root construction.
//! - [`css`]: CSS selector parsing and translation to `XPath`.
//! - [`xpath`]: the `XPath` engine and its extension functions.
//! - [`html`], [`parser`]: tree builders; [`serial`]: serializers.
//! - [`util`]: regex extraction and flattening.

pub mod css;
pub mod encoding;
pub mod error;
pub mod html;
pub mod parser;
pub mod selector;
pub mod serial;
pub mod tree;
pub mod util;
pub mod xpath;

// Re-export primary types at the crate root for convenience.
pub use css::css2xpath;
pub use error::{Error, Result};
pub use selector::{Backing, Kind, Root, Selection, SelectionBuilder, SelectionList, XPathOptions};
pub use tree::{Attribute, Document, NodeId};
pub use util::{extract_regex, flatten, iflatten, Nested};
