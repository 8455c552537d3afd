//! HTML document construction.
//!
//! Markup is parsed by the HTML5 tree builder in `scraper` and the result
//! is copied into the crate's arena [`Document`], so HTML and XML selections
//! share one tree type and one `XPath` engine.
//!
//! HTML element names are lower-case and carry no namespace. Like every
//! browser, the tree builder inserts implied `html`, `head` and `body`
//! elements.
//!
//! # Examples
//!
//! ```
//! use seloxide::html::parse_html;
//!
//! let doc = parse_html("<p>Hello <b>world</b>");
//! let root = doc.root_element().unwrap();
//! assert_eq!(doc.node_name(root), Some("html"));
//! ```

use scraper::{Html, Node};

use crate::parser::{
    ensure_root_element, normalize_input, ParseOptions, SizeGuard, EMPTY_DOCUMENT,
};
use crate::tree::{Attribute, Document, Flavor, NodeKind};

/// Parses an HTML document with default options.
#[must_use]
pub fn parse_html(input: &str) -> Document {
    parse_html_with(input, &ParseOptions::default())
}

/// Parses an HTML document.
///
/// Parsing never fails. Empty input yields a lone `<html></html>` root.
#[must_use]
pub fn parse_html_with(input: &str, options: &ParseOptions) -> Document {
    let input = normalize_input(input);
    let mut doc = Document::new(Flavor::Html);
    // Empty input gets a bare root, without implied head and body.
    if input != EMPTY_DOCUMENT {
        let html = Html::parse_document(&input);
        if !html.errors.is_empty() {
            tracing::trace!(count = html.errors.len(), "recovered from HTML parse errors");
        }
        let mut guard = SizeGuard::new(options);
        copy_tree(&mut doc, &mut guard, &html);
    }
    ensure_root_element(&mut doc);
    doc
}

/// Copies the parsed tree under the document node, depth first.
fn copy_tree(doc: &mut Document, guard: &mut SizeGuard<'_>, html: &Html) {
    let mut pending: Vec<_> = html
        .tree
        .root()
        .children()
        .rev()
        .map(|child| (child, doc.root(), 1))
        .collect();

    while let Some((node, parent, depth)) = pending.pop() {
        let kind = match node.value() {
            Node::Document | Node::Fragment => {
                pending.extend(node.children().rev().map(|child| (child, parent, depth)));
                continue;
            }
            Node::Element(element) => {
                if guard.too_deep(depth) {
                    continue;
                }
                NodeKind::Element {
                    name: element.name().to_owned(),
                    prefix: None,
                    namespace: None,
                    attributes: element
                        .attrs()
                        .map(|(name, value)| Attribute::new(name, value))
                        .collect(),
                    namespace_decls: Vec::new(),
                }
            }
            Node::Text(text) => {
                if parent == doc.root() {
                    continue;
                }
                NodeKind::Text {
                    content: guard.clamp_text(text.to_string()),
                }
            }
            Node::Comment(comment) => NodeKind::Comment {
                content: comment.to_string(),
            },
            Node::Doctype(doctype) => NodeKind::DocumentType {
                name: doctype.name().to_owned(),
                public_id: non_empty(doctype.public_id()),
                system_id: non_empty(doctype.system_id()),
            },
            Node::ProcessingInstruction(pi) => NodeKind::ProcessingInstruction {
                target: pi.target.to_string(),
                data: non_empty(&pi.data),
            },
        };

        let is_element = kind.is_element();
        let id = doc.create_node(kind);
        doc.append_child(parent, id);
        if is_element {
            pending.extend(node.children().rev().map(|child| (child, id, depth + 1)));
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}
