//! XML output method.
//!
//! A serialized subtree is self-contained: its root element carries a
//! declaration for every namespace in scope that it does not declare
//! itself. Output is never indented and never starts with an XML
//! declaration.

use crate::tree::{Attribute, Document, NamespaceDecl, NodeId, NodeKind};

/// Serializes a whole document as XML.
///
/// # Examples
///
/// ```
/// use seloxide::parser::parse_xml;
/// use seloxide::serial::xml::serialize_xml;
///
/// let doc = parse_xml("<root><child>Hello</child><empty></empty></root>");
/// assert_eq!(serialize_xml(&doc), "<root><child>Hello</child><empty/></root>");
/// ```
#[must_use]
pub fn serialize_xml(doc: &Document) -> String {
    node_to_xml(doc, doc.root())
}

/// Serializes one node and its subtree as XML, without its tail text.
#[must_use]
pub fn node_to_xml(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    if doc.node(id).kind.is_element() {
        let inherited: Vec<NamespaceDecl> = match doc.parent(id) {
            Some(parent) => doc
                .in_scope_namespaces(parent)
                .into_iter()
                .filter(|decl| {
                    !doc.namespace_decls(id)
                        .iter()
                        .any(|own| own.prefix == decl.prefix)
                })
                .collect(),
            None => Vec::new(),
        };
        write_element(doc, id, &inherited, &mut out);
    } else {
        write_node(doc, id, &mut out);
    }
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match &doc.node(id).kind {
        NodeKind::Document => {
            for child in doc.children(id) {
                write_node(doc, child, out);
            }
        }
        NodeKind::Element { .. } => write_element(doc, id, &[], out),
        NodeKind::Text { content } => write_escaped_text(out, content),
        NodeKind::CData { content } => {
            out.push_str("<![CDATA[");
            out.push_str(content);
            out.push_str("]]>");
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
            out.push_str("?>");
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
            if let Some(public) = public_id {
                out.push_str(" PUBLIC \"");
                out.push_str(public);
                out.push('"');
                if let Some(system) = system_id {
                    out.push_str(" \"");
                    out.push_str(system);
                    out.push('"');
                }
            } else if let Some(system) = system_id {
                out.push_str(" SYSTEM \"");
                out.push_str(system);
                out.push('"');
            }
            out.push('>');
        }
    }
}

fn write_element(doc: &Document, id: NodeId, inherited: &[NamespaceDecl], out: &mut String) {
    let NodeKind::Element {
        attributes,
        namespace_decls,
        ..
    } = &doc.node(id).kind
    else {
        return;
    };
    let tag = doc.qualified_name(id).unwrap_or_default();
    out.push('<');
    out.push_str(&tag);
    for decl in namespace_decls.iter().chain(inherited) {
        write_namespace_decl(decl, out);
    }
    for attr in attributes {
        write_attribute(attr, out);
    }

    if doc.first_child(id).is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in doc.children(id) {
        write_node(doc, child, out);
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn write_namespace_decl(decl: &NamespaceDecl, out: &mut String) {
    out.push_str(" xmlns");
    if let Some(prefix) = &decl.prefix {
        out.push(':');
        out.push_str(prefix);
    }
    out.push_str("=\"");
    write_escaped_attr(out, &decl.uri);
    out.push('"');
}

fn write_attribute(attr: &Attribute, out: &mut String) {
    out.push(' ');
    out.push_str(&attr.qualified_name());
    out.push_str("=\"");
    write_escaped_attr(out, &attr.value);
    out.push('"');
}

fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::parse_xml;

    fn first(doc: &Document, name: &str) -> NodeId {
        doc.descendants(doc.root())
            .find(|&id| doc.node_name(id) == Some(name))
            .unwrap()
    }

    #[test]
    fn test_empty_elements_self_close() {
        let doc = parse_xml("<r><a></a><b x='1'/></r>");
        assert_eq!(serialize_xml(&doc), r#"<r><a/><b x="1"/></r>"#);
    }

    #[test]
    fn test_tail_text_excluded() {
        let doc = parse_xml("<r><a>in</a>tail</r>");
        assert_eq!(node_to_xml(&doc, first(&doc, "a")), "<a>in</a>");
    }

    #[test]
    fn test_inherited_namespaces_declared_on_subtree_root() {
        let doc = parse_xml(
            r#"<feed xmlns="urn:atom" xmlns:m="urn:m"><entry><m:t>x</m:t></entry></feed>"#,
        );
        assert_eq!(
            node_to_xml(&doc, first(&doc, "t")),
            r#"<m:t xmlns="urn:atom" xmlns:m="urn:m">x</m:t>"#
        );
    }

    #[test]
    fn test_own_declaration_not_repeated() {
        let doc = parse_xml(r#"<r xmlns:p="urn:outer"><p:c xmlns:p="urn:inner"/></r>"#);
        assert_eq!(
            node_to_xml(&doc, first(&doc, "c")),
            r#"<p:c xmlns:p="urn:inner"/>"#
        );
    }

    #[test]
    fn test_escaping() {
        let doc = parse_xml("<r a='x&quot;y&#10;'>1 &lt; 2 &amp; 3 &gt; 2</r>");
        assert_eq!(
            serialize_xml(&doc),
            r#"<r a="x&quot;y&#10;">1 &lt; 2 &amp; 3 &gt; 2</r>"#
        );
    }

    #[test]
    fn test_cdata_comment_pi_and_entity_ref() {
        let doc = parse_xml("<r><![CDATA[a<b]]><!--c--><?pi d?>&ent;</r>");
        assert_eq!(
            serialize_xml(&doc),
            "<r><![CDATA[a<b]]><!--c--><?pi d?>&ent;</r>"
        );
    }

    #[test]
    fn test_stripped_namespaces_not_emitted() {
        let mut doc = parse_xml(r#"<r xmlns="urn:x"><a/></r>"#);
        let root = doc.root_element().unwrap();
        doc.strip_namespaces(root);
        assert_eq!(serialize_xml(&doc), "<r><a/></r>");
    }
}
