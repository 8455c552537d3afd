//! Recovering XML tree builder over `quick-xml` events.
//!
//! The reader does the tokenizing; this module turns its events into the
//! arena tree:
//!
//! - namespace declarations are resolved with a scope stack and recorded on
//!   the element that makes them;
//! - the five predefined entities and character references are decoded,
//!   while any other entity reference becomes an [`NodeKind::EntityRef`]
//!   node in text (attributes keep it literally);
//! - an end tag closes the nearest open element with the same name and is
//!   ignored when nothing matches;
//! - a reader error ends the parse, keeping everything built so far.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::tree::{Attribute, Document, Flavor, NamespaceDecl, NodeId, NodeKind, XML_NAMESPACE};

use super::{ensure_root_element, ParseOptions, SizeGuard};

/// A piece of decoded character data.
#[derive(Debug, PartialEq, Eq)]
enum Chunk {
    Text(String),
    EntityRef(String),
}

pub(super) struct TreeBuilder<'o> {
    doc: Document,
    /// Open elements, the document node first.
    stack: Vec<NodeId>,
    /// Namespace declarations made by each open element.
    scopes: Vec<Vec<NamespaceDecl>>,
    /// Nesting level inside elements dropped by the size guard.
    skipped: usize,
    guard: SizeGuard<'o>,
}

impl<'o> TreeBuilder<'o> {
    pub(super) fn new(options: &'o ParseOptions) -> Self {
        let doc = Document::new(Flavor::Xml);
        let root = doc.root();
        Self {
            doc,
            stack: vec![root],
            scopes: vec![Vec::new()],
            skipped: 0,
            guard: SizeGuard::new(options),
        }
    }

    pub(super) fn build(mut self, input: &str) -> Document {
        let mut reader = Reader::from_str(input);
        reader.trim_text(false);
        reader.check_end_names(false);
        reader.expand_empty_elements(false);

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(
                        position = reader.buffer_position(),
                        error = %err,
                        "malformed XML, keeping the partial tree"
                    );
                    break;
                }
            };
            match event {
                Event::Start(start) => self.start_element(&start, false),
                Event::Empty(start) => self.start_element(&start, true),
                Event::End(end) => self.end_element(&String::from_utf8_lossy(end.name().as_ref())),
                Event::Text(text) => {
                    let raw = String::from_utf8_lossy(&text).into_owned();
                    for chunk in decode_character_data(&raw) {
                        match chunk {
                            Chunk::Text(content) => self.append_text(content),
                            Chunk::EntityRef(name) => {
                                self.append_leaf(NodeKind::EntityRef { name });
                            }
                        }
                    }
                }
                Event::CData(data) => {
                    let content = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    let content = self.guard.clamp_text(content);
                    self.append_leaf(NodeKind::CData { content });
                }
                Event::Comment(comment) => {
                    let content = String::from_utf8_lossy(&comment).into_owned();
                    self.append_leaf(NodeKind::Comment { content });
                }
                Event::PI(pi) => {
                    let raw = String::from_utf8_lossy(&pi).into_owned();
                    let (target, data) = match raw.split_once(|c: char| c.is_ascii_whitespace()) {
                        Some((target, data)) => (target.to_owned(), Some(data.trim_start().to_owned())),
                        None => (raw, None),
                    };
                    self.append_leaf(NodeKind::ProcessingInstruction { target, data });
                }
                Event::DocType(doctype) => {
                    let raw = String::from_utf8_lossy(&doctype).into_owned();
                    self.append_leaf(parse_doctype(&raw));
                }
                Event::Decl(_) => {}
                Event::Eof => break,
            }
        }

        ensure_root_element(&mut self.doc);
        self.doc
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.doc.root())
    }

    fn start_element(&mut self, start: &BytesStart<'_>, empty: bool) {
        if self.skipped > 0 || self.guard.too_deep(self.stack.len() + 1) {
            if !empty {
                self.skipped += 1;
            }
            return;
        }

        let qname = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut decls = Vec::new();
        let mut raw_attributes = Vec::new();
        let mut attributes = start.attributes();
        attributes.with_checks(false);
        for attr in attributes {
            let Ok(attr) = attr else {
                tracing::debug!(element = %qname, "skipping malformed attribute");
                continue;
            };
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = decode_attribute(&String::from_utf8_lossy(&attr.value));
            if key == "xmlns" {
                decls.push(NamespaceDecl { prefix: None, uri: value });
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                decls.push(NamespaceDecl {
                    prefix: Some(prefix.to_owned()),
                    uri: value,
                });
            } else {
                raw_attributes.push((key, value));
            }
        }
        self.scopes.push(decls.clone());

        let (prefix, local) = split_qname(&qname);
        let (prefix, name, namespace) = match self.resolve(prefix, true) {
            Some(uri) => (prefix.map(str::to_owned), local.to_owned(), uri),
            // An undeclared prefix stays part of the name.
            None => (None, qname.clone(), None),
        };

        let attributes = raw_attributes
            .into_iter()
            .map(|(key, value)| {
                let (prefix, local) = split_qname(&key);
                let resolved = prefix.and_then(|p| {
                    self.resolve(Some(p), false)
                        .map(|uri| (p.to_owned(), local.to_owned(), uri))
                });
                match resolved {
                    Some((prefix, name, namespace)) => Attribute {
                        name,
                        value,
                        prefix: Some(prefix),
                        namespace,
                    },
                    None => Attribute::new(key, value),
                }
            })
            .collect();

        let element = self.doc.create_node(NodeKind::Element {
            name,
            prefix,
            namespace,
            attributes,
            namespace_decls: decls,
        });
        let parent = self.current();
        self.doc.append_child(parent, element);

        if empty {
            self.scopes.pop();
        } else {
            self.stack.push(element);
        }
    }

    /// Resolves a prefix against the open scopes.
    ///
    /// Returns `None` for an undeclared prefix and `Some(None)` for a name
    /// in no namespace. Unprefixed attributes never take the default
    /// namespace.
    fn resolve(&self, prefix: Option<&str>, is_element: bool) -> Option<Option<String>> {
        if prefix == Some("xml") {
            return Some(Some(XML_NAMESPACE.to_owned()));
        }
        if prefix.is_none() && !is_element {
            return Some(None);
        }
        let declared = self
            .scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|decl| decl.prefix.as_deref() == prefix);
        match (declared, prefix) {
            (Some(decl), _) if decl.uri.is_empty() => Some(None),
            (Some(decl), _) => Some(Some(decl.uri.clone())),
            (None, None) => Some(None),
            (None, Some(_)) => None,
        }
    }

    fn end_element(&mut self, qname: &str) {
        if self.skipped > 0 {
            self.skipped -= 1;
            return;
        }
        let open = self
            .stack
            .iter()
            .skip(1)
            .rposition(|&id| self.doc.qualified_name(id).as_deref() == Some(qname));
        match open {
            Some(index) => {
                let keep = index + 1;
                self.stack.truncate(keep);
                self.scopes.truncate(keep);
            }
            None => tracing::debug!(tag = qname, "ignoring unmatched end tag"),
        }
    }

    fn append_text(&mut self, content: String) {
        if self.skipped > 0 || content.is_empty() {
            return;
        }
        let parent = self.current();
        // Character data outside the root element is not part of the tree.
        if parent == self.doc.root() {
            return;
        }
        let content = self.guard.clamp_text(content);
        if let Some(last) = self.doc.last_child(parent) {
            if let NodeKind::Text { content: existing } = &mut self.doc.node_mut(last).kind {
                existing.push_str(&content);
                return;
            }
        }
        self.append_leaf(NodeKind::Text { content });
    }

    fn append_leaf(&mut self, kind: NodeKind) {
        if self.skipped > 0 {
            return;
        }
        let parent = self.current();
        if parent == self.doc.root() && kind.is_text_like() {
            return;
        }
        let node = self.doc.create_node(kind);
        self.doc.append_child(parent, node);
    }
}

/// Splits `prefix:local`; names without a colon have no prefix.
fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => (Some(prefix), local),
        _ => (None, qname),
    }
}

/// Decodes text content into text and entity reference chunks.
fn decode_character_data(raw: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut text = String::new();
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        text.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match reference_at(after) {
            Some((Reference::Char(c), len)) => {
                text.push(c);
                rest = &after[len..];
            }
            Some((Reference::Named(name), len)) => {
                if !text.is_empty() {
                    chunks.push(Chunk::Text(std::mem::take(&mut text)));
                }
                chunks.push(Chunk::EntityRef(name.to_owned()));
                rest = &after[len..];
            }
            None => {
                text.push('&');
                rest = after;
            }
        }
    }
    text.push_str(rest);
    if !text.is_empty() {
        chunks.push(Chunk::Text(text));
    }
    chunks
}

/// Decodes an attribute value. Unknown entity references stay literal.
fn decode_attribute(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match reference_at(after) {
            Some((Reference::Char(c), len)) => {
                out.push(c);
                rest = &after[len..];
            }
            Some((Reference::Named(name), len)) => {
                out.push('&');
                out.push_str(name);
                out.push(';');
                rest = &after[len..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

enum Reference<'a> {
    Char(char),
    Named(&'a str),
}

/// Reads a reference body (`lt;`, `#38;`, `#x26;`) at the start of `s`
/// and returns it with the number of bytes consumed, `;` included.
fn reference_at(s: &str) -> Option<(Reference<'_>, usize)> {
    let end = s.find(';')?;
    let body = &s[..end];
    if body.is_empty() {
        return None;
    }
    let reference = if let Some(hex) = body.strip_prefix("#x") {
        Reference::Char(char::from_u32(u32::from_str_radix(hex, 16).ok()?)?)
    } else if let Some(dec) = body.strip_prefix('#') {
        Reference::Char(char::from_u32(dec.parse().ok()?)?)
    } else {
        match body {
            "lt" => Reference::Char('<'),
            "gt" => Reference::Char('>'),
            "amp" => Reference::Char('&'),
            "apos" => Reference::Char('\''),
            "quot" => Reference::Char('"'),
            name if is_name(name) => Reference::Named(name),
            _ => return None,
        }
    };
    Some((reference, end + 1))
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

/// Reads the name and external identifiers out of a DOCTYPE body.
fn parse_doctype(raw: &str) -> NodeKind {
    let raw = raw.trim();
    let (name, rest) = raw
        .split_once(|c: char| c.is_ascii_whitespace())
        .unwrap_or((raw, ""));
    let quoted: Vec<&str> = rest.split(['"', '\'']).skip(1).step_by(2).collect();
    let rest = rest.trim_start();
    let (public_id, system_id) = if rest.starts_with("PUBLIC") {
        (quoted.first().map(|s| (*s).to_owned()), quoted.get(1).map(|s| (*s).to_owned()))
    } else if rest.starts_with("SYSTEM") {
        (None, quoted.first().map(|s| (*s).to_owned()))
    } else {
        (None, None)
    };
    NodeKind::DocumentType {
        name: name.to_owned(),
        public_id,
        system_id,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::{parse_xml, parse_xml_with};

    #[test]
    fn test_parse_basic_tree() {
        let doc = parse_xml("<root><a x='1'>hi</a><b/></root>");
        let root = doc.root_element().unwrap();
        assert_eq!(doc.node_name(root), Some("root"));
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(doc.attribute(children[0], "x"), Some("1"));
        assert_eq!(doc.text_content(root), "hi");
    }

    #[test]
    fn test_namespaces_resolved() {
        let doc = parse_xml(
            r#"<feed xmlns="urn:atom" xmlns:m="urn:media"><m:thumb m:url="u" plain="p"/></feed>"#,
        );
        let feed = doc.root_element().unwrap();
        assert_eq!(doc.node_namespace(feed), Some("urn:atom"));
        assert_eq!(doc.namespace_decls(feed).len(), 2);
        let thumb = doc.first_child(feed).unwrap();
        assert_eq!(doc.node_namespace(thumb), Some("urn:media"));
        assert_eq!(doc.qualified_name(thumb).as_deref(), Some("m:thumb"));
        let attrs = doc.attributes(thumb);
        assert_eq!(attrs[0].clark_name(), "{urn:media}url");
        assert_eq!(attrs[1].namespace, None);
    }

    #[test]
    fn test_xml_prefix_is_predeclared() {
        let doc = parse_xml(r#"<r xml:lang="en"/>"#);
        let r = doc.root_element().unwrap();
        assert_eq!(doc.attributes(r)[0].namespace.as_deref(), Some(XML_NAMESPACE));
    }

    #[test]
    fn test_predefined_and_unknown_entities() {
        let doc = parse_xml("<r a='&lt;&foo;'>a &amp; b &#65;&#x42; &foo; c</r>");
        let r = doc.root_element().unwrap();
        assert_eq!(doc.attribute(r, "a"), Some("<&foo;"));
        let kinds: Vec<_> = doc.children(r).map(|id| doc.node(id).kind.clone()).collect();
        assert_eq!(kinds.len(), 3);
        assert!(matches!(&kinds[1], NodeKind::EntityRef { name } if name == "foo"));
        assert_eq!(doc.text_content(r), "a & b AB &foo; c");
    }

    #[test]
    fn test_dtd_entities_not_expanded() {
        let xml = r#"<!DOCTYPE r [<!ENTITY xxe SYSTEM "file:///etc/passwd">]><r>&xxe;</r>"#;
        let doc = parse_xml(xml);
        let r = doc.root_element().unwrap();
        assert_eq!(doc.text_content(r), "&xxe;");
    }

    #[test]
    fn test_mismatched_end_tags_recover() {
        let doc = parse_xml("<r><a><b>x</a><c/></r>");
        let r = doc.root_element().unwrap();
        let names: Vec<_> = doc.children(r).filter_map(|id| doc.node_name(id)).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_unclosed_elements_kept() {
        let doc = parse_xml("<r><a>text");
        assert_eq!(doc.text_content(doc.root_element().unwrap()), "text");
    }

    #[test]
    fn test_no_element_falls_back_to_html() {
        let doc = parse_xml("just text");
        let root = doc.root_element().unwrap();
        assert_eq!(doc.node_name(root), Some("html"));
        assert!(doc.first_child(root).is_none());
    }

    #[test]
    fn test_cdata_comment_and_pi() {
        let doc = parse_xml("<r><![CDATA[<x>]]><!--c--><?php echo 1?></r>");
        let r = doc.root_element().unwrap();
        let kinds: Vec<_> = doc.children(r).map(|id| doc.node(id).kind.clone()).collect();
        assert!(matches!(&kinds[0], NodeKind::CData { content } if content == "<x>"));
        assert!(matches!(&kinds[1], NodeKind::Comment { content } if content == "c"));
        assert!(matches!(
            &kinds[2],
            NodeKind::ProcessingInstruction { target, data: Some(data) }
                if target == "php" && data == "echo 1"
        ));
    }

    #[test]
    fn test_size_guard_limits_depth() {
        let deep = format!("{}x{}", "<a>".repeat(10), "</a>".repeat(10));
        let opts = ParseOptions::default().size_guard(true).max_depth(3);
        let doc = parse_xml_with(&deep, &opts);
        let depth = doc.descendants(doc.root()).filter(|&id| doc.node(id).kind.is_element()).count();
        assert_eq!(depth, 3);
        let unguarded = parse_xml(&deep);
        assert_eq!(unguarded.text_content(unguarded.root()), "x");
    }

    #[test]
    fn test_doctype_parsed() {
        let kind = parse_doctype(r#"html PUBLIC "-//W3C//DTD XHTML 1.0//EN" "http://x/dtd""#);
        assert_eq!(
            kind,
            NodeKind::DocumentType {
                name: "html".to_string(),
                public_id: Some("-//W3C//DTD XHTML 1.0//EN".to_string()),
                system_id: Some("http://x/dtd".to_string()),
            }
        );
    }
}
