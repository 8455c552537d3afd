//! HTML output method.
//!
//! Differences from the XML output method:
//!
//! - void elements are written as `<br>` and never closed
//! - empty non-void elements are written as `<p></p>`
//! - `script` and `style` content is written without escaping
//! - boolean attributes (`checked`, `disabled`, ...) are written bare
//! - spaces in URI attributes (`href`, `src`, ...) become `%20`
//! - processing instructions end with `>` rather than `?>`

use crate::tree::{Attribute, Document, NodeId, NodeKind};

/// Serializes a whole document as HTML.
///
/// # Examples
///
/// ```
/// use seloxide::html::parse_html;
/// use seloxide::serial::html::serialize_html;
///
/// let doc = parse_html("<p>Hello<br>there</p>");
/// assert_eq!(
///     serialize_html(&doc),
///     "<html><head></head><body><p>Hello<br>there</p></body></html>"
/// );
/// ```
#[must_use]
pub fn serialize_html(doc: &Document) -> String {
    node_to_html(doc, doc.root())
}

/// Serializes one node and its subtree as HTML, without its tail text.
#[must_use]
pub fn node_to_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

pub(crate) fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
            | "basefont"
            | "frame"
            | "isindex"
    )
}

fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn is_boolean_attribute(name: &str) -> bool {
    matches!(
        name,
        "checked"
            | "compact"
            | "declare"
            | "defer"
            | "disabled"
            | "ismap"
            | "multiple"
            | "nohref"
            | "noresize"
            | "noshade"
            | "nowrap"
            | "readonly"
            | "selected"
    )
}

fn is_uri_attribute(name: &str) -> bool {
    matches!(
        name,
        "href"
            | "src"
            | "action"
            | "background"
            | "cite"
            | "classid"
            | "codebase"
            | "data"
            | "longdesc"
            | "profile"
            | "usemap"
    )
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match &doc.node(id).kind {
        NodeKind::Document => {
            for child in doc.children(id) {
                write_node(doc, child, out);
            }
        }
        NodeKind::Element { attributes, .. } => {
            let tag = doc.qualified_name(id).unwrap_or_default();
            out.push('<');
            out.push_str(&tag);
            for attr in attributes {
                write_attribute(attr, out);
            }
            out.push('>');

            let lower = tag.to_ascii_lowercase();
            if is_void_element(&lower) {
                return;
            }
            let raw = is_raw_text_element(&lower);
            for child in doc.children(id) {
                match &doc.node(child).kind {
                    NodeKind::Text { content } if raw => out.push_str(content),
                    _ => write_node(doc, child, out),
                }
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }
        NodeKind::Text { content } | NodeKind::CData { content } => {
            write_escaped_text(out, content);
        }
        NodeKind::Comment { content } => {
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if let Some(data) = data {
                out.push(' ');
                out.push_str(data);
            }
            out.push('>');
        }
        NodeKind::EntityRef { name } => {
            out.push('&');
            out.push_str(name);
            out.push(';');
        }
        NodeKind::DocumentType {
            name,
            public_id,
            system_id,
        } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            match (public_id, system_id) {
                (Some(public), Some(system)) => {
                    out.push_str(&format!(" PUBLIC \"{public}\" \"{system}\""));
                }
                (Some(public), None) => out.push_str(&format!(" PUBLIC \"{public}\"")),
                (None, Some(system)) => out.push_str(&format!(" SYSTEM \"{system}\"")),
                (None, None) => {}
            }
            out.push('>');
        }
    }
}

fn write_attribute(attr: &Attribute, out: &mut String) {
    out.push(' ');
    out.push_str(&attr.qualified_name());
    if is_boolean_attribute(&attr.name) && (attr.value.is_empty() || attr.value == attr.name) {
        return;
    }
    // Single quotes avoid escaping a value that only contains double quotes.
    if attr.value.contains('"') && !attr.value.contains('\'') {
        out.push_str("='");
        for ch in attr.value.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ => out.push(ch),
            }
        }
        out.push('\'');
        return;
    }
    let uri = is_uri_attribute(&attr.name);
    out.push_str("=\"");
    for ch in attr.value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            ' ' if uri => out.push_str("%20"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    fn first(doc: &Document, name: &str) -> NodeId {
        doc.descendants(doc.root())
            .find(|&id| doc.node_name(id) == Some(name))
            .unwrap()
    }

    #[test]
    fn test_void_elements_not_closed() {
        let doc = parse_html(r#"<div><br><img src="x.png"></div>"#);
        assert_eq!(
            node_to_html(&doc, first(&doc, "div")),
            r#"<div><br><img src="x.png"></div>"#
        );
    }

    #[test]
    fn test_empty_element_has_end_tag() {
        let doc = parse_html("<p></p>");
        assert_eq!(node_to_html(&doc, first(&doc, "p")), "<p></p>");
    }

    #[test]
    fn test_tail_text_excluded() {
        let doc = parse_html("<div><b>bold</b> tail</div>");
        assert_eq!(node_to_html(&doc, first(&doc, "b")), "<b>bold</b>");
    }

    #[test]
    fn test_script_content_not_escaped() {
        let doc = parse_html("<script>if (a < b && c) {}</script>");
        assert_eq!(
            node_to_html(&doc, first(&doc, "script")),
            "<script>if (a < b && c) {}</script>"
        );
    }

    #[test]
    fn test_text_and_attribute_escaping() {
        let doc = parse_html(r#"<a href="a b?x=1&amp;y=2" title='say "hi"'>1 &lt; 2</a>"#);
        assert_eq!(
            node_to_html(&doc, first(&doc, "a")),
            r#"<a href="a%20b?x=1&amp;y=2" title='say "hi"'>1 &lt; 2</a>"#
        );
    }

    #[test]
    fn test_boolean_attribute_bare() {
        let doc = parse_html("<input type=checkbox checked disabled>");
        assert_eq!(
            node_to_html(&doc, first(&doc, "input")),
            r#"<input type="checkbox" checked disabled>"#
        );
    }

    #[test]
    fn test_comment_and_doctype() {
        let doc = parse_html("<!DOCTYPE html><p><!-- note -->x</p>");
        let out = serialize_html(&doc);
        assert!(out.starts_with("<!DOCTYPE html><html>"));
        assert!(out.contains("<p><!-- note -->x</p>"));
    }
}
