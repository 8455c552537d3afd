//! Arena-based document tree shared by the HTML and XML builders.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the [`Document`]
//! and are referenced by [`NodeId`], a newtype over `NonZeroU32`. Navigation
//! links (parent, first\_child, last\_child, next\_sibling, prev\_sibling) are
//! arena indices, so any number of selections can hold ids into the same
//! tree without borrowing it.
//!
//! Nodes are allocated in document order by the builders, which lets the
//! `XPath` evaluator sort node-sets by id. Detached nodes stay allocated but
//! become unreachable from the document node.

mod node;

pub use node::NodeKind;

use std::num::NonZeroU32;

/// A typed index into the document's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or does not fit in a `u32`.
    #[allow(clippy::expect_used)]
    fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index).expect("document arena exceeds u32::MAX nodes");
        Self(NonZeroU32::new(raw).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Whether a document was built by the HTML or the XML builder.
///
/// The flavor picks the serializer and decides which attribute acts as an
/// element ID (`id` for HTML, `xml:id` for XML).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Built from HTML by the HTML5 tree builder.
    Html,
    /// Built from XML by the recovering XML builder.
    Xml,
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node. The document node and detached nodes have none.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The local name (`lang` for `xml:lang`).
    pub name: String,
    /// The decoded value.
    pub value: String,
    /// Namespace prefix as written in the source.
    pub prefix: Option<String>,
    /// Resolved namespace URI, if any.
    pub namespace: Option<String>,
}

impl Attribute {
    /// Creates an attribute without a namespace.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            prefix: None,
            namespace: None,
        }
    }

    /// Returns the name as written in markup (`prefix:local` or `local`).
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Returns the name in Clark notation (`{uri}local` or `local`).
    #[must_use]
    pub fn clark_name(&self) -> String {
        match &self.namespace {
            Some(uri) => format!("{{{uri}}}{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A namespace declaration made on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// The declared prefix, or `None` for the default namespace.
    pub prefix: Option<String>,
    /// The namespace URI.
    pub uri: String,
}

/// The `xml` prefix namespace, always in scope.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A parsed HTML or XML document.
///
/// The `Document` owns all nodes and provides navigation through `&Document`
/// and mutation through `&mut Document`.
#[derive(Debug, Clone)]
pub struct Document {
    /// The node arena. Index 0 is an unused placeholder.
    nodes: Vec<NodeData>,
    /// The document node.
    root: NodeId,
    /// Which builder produced the tree.
    flavor: Flavor,
    /// Base URL the document was loaded from, if known.
    pub url: Option<String>,
}

impl Document {
    /// Creates an empty document holding only the document node.
    #[must_use]
    pub fn new(flavor: Flavor) -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(NodeData::new(NodeKind::Document));
        nodes.push(NodeData::new(NodeKind::Document));
        Self {
            nodes,
            root: NodeId::from_index(1),
            flavor,
            url: None,
        }
    }

    /// Returns the flavor this document was built with.
    #[must_use]
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Returns the document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the first element child of the document node.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.node(id).kind.is_element())
    }

    /// Returns the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the local name of an element or the target of a PI.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the element name as written in markup (`prefix:local`).
    #[must_use]
    pub fn qualified_name(&self, id: NodeId) -> Option<String> {
        match &self.node(id).kind {
            NodeKind::Element {
                name,
                prefix: Some(prefix),
                ..
            } => Some(format!("{prefix}:{name}")),
            NodeKind::Element { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    /// Returns the namespace URI of an element node, if any.
    #[must_use]
    pub fn node_namespace(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// Returns the string-value of a node as defined by `XPath`.
    ///
    /// Elements and the document node concatenate their descendant text;
    /// leaf nodes return their own content.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Comment { content } => buf.push_str(content),
            NodeKind::ProcessingInstruction { data, .. } => {
                buf.push_str(data.as_deref().unwrap_or_default());
            }
            NodeKind::EntityRef { name } => {
                buf.push('&');
                buf.push_str(name);
                buf.push(';');
            }
            NodeKind::DocumentType { .. } => {}
            NodeKind::Element { .. } | NodeKind::Document => {
                for child in self.children(id) {
                    if !matches!(
                        self.node(child).kind,
                        NodeKind::Comment { .. } | NodeKind::ProcessingInstruction { .. }
                    ) {
                        self.collect_text(child, buf);
                    }
                }
            }
        }
    }

    /// Returns the text that precedes the first non-text child of an element.
    ///
    /// Returns `None` when the element starts with a child element or has no
    /// children at all.
    #[must_use]
    pub fn leading_text(&self, id: NodeId) -> Option<String> {
        let mut text: Option<String> = None;
        for child in self.children(id) {
            match &self.node(child).kind {
                NodeKind::Text { content } | NodeKind::CData { content } => {
                    text.get_or_insert_with(String::new).push_str(content);
                }
                _ => break,
            }
        }
        text
    }

    /// Returns the attributes of an element node, or an empty slice.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Returns the value of a namespace-less attribute.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.namespace.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns the namespace declarations made directly on an element.
    #[must_use]
    pub fn namespace_decls(&self, id: NodeId) -> &[NamespaceDecl] {
        match &self.node(id).kind {
            NodeKind::Element {
                namespace_decls, ..
            } => namespace_decls,
            _ => &[],
        }
    }

    /// Returns every namespace declaration in scope at `id`.
    ///
    /// Inner declarations shadow outer ones with the same prefix.
    #[must_use]
    pub fn in_scope_namespaces(&self, id: NodeId) -> Vec<NamespaceDecl> {
        let mut scope: Vec<NamespaceDecl> = Vec::new();
        let chain: Vec<NodeId> = self.ancestors(id).collect();
        for &ancestor in chain.iter().rev() {
            for decl in self.namespace_decls(ancestor) {
                scope.retain(|d| d.prefix != decl.prefix);
                scope.push(decl.clone());
            }
        }
        scope
    }

    /// Finds the first element in document order whose ID equals `value`.
    ///
    /// HTML documents use the `id` attribute; XML documents use `xml:id`.
    #[must_use]
    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendants(self.root).find(|&id| {
            self.attributes(id).iter().any(|a| {
                a.value == value
                    && match self.flavor {
                        Flavor::Html => a.namespace.is_none() && a.name == "id",
                        Flavor::Xml => {
                            a.name == "id" && a.namespace.as_deref() == Some(XML_NAMESPACE)
                        }
                    }
            })
        })
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over a node and its ancestors.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns a depth-first iterator over the descendants of a node.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    // --- Mutation ---

    /// Allocates a detached node and returns its id.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Appends a detached node to the end of a parent's child list.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent; detach it first"
        );

        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    /// Detaches a node from its parent. The node stays allocated.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        let data = self.node_mut(id);
        data.parent = None;
        data.prev_sibling = None;
        data.next_sibling = None;
    }

    /// Removes an element together with its tail, the text nodes that
    /// directly follow it.
    pub fn remove_with_tail(&mut self, id: NodeId) {
        while let Some(next) = self.next_sibling(id) {
            if !matches!(
                self.node(next).kind,
                NodeKind::Text { .. } | NodeKind::CData { .. }
            ) {
                break;
            }
            self.detach(next);
        }
        self.detach(id);
    }

    /// Removes an element but keeps its tail text in the tree, merging it
    /// into a preceding text node when the two become adjacent.
    pub fn drop_tree(&mut self, id: NodeId) {
        let prev = self.prev_sibling(id);
        let next = self.next_sibling(id);
        self.detach(id);

        let (Some(prev), Some(next)) = (prev, next) else {
            return;
        };
        let tail = match &self.node(next).kind {
            NodeKind::Text { content } => content.clone(),
            _ => return,
        };
        if let NodeKind::Text { content } = &mut self.node_mut(prev).kind {
            content.push_str(&tail);
            self.detach(next);
        }
    }

    /// Strips namespace URIs and prefixes from `id` and every element below
    /// it, then drops all namespace declarations in that subtree.
    pub fn strip_namespaces(&mut self, id: NodeId) {
        let mut targets = vec![id];
        targets.extend(self.descendants(id));
        for target in targets {
            if let NodeKind::Element {
                prefix,
                namespace,
                attributes,
                namespace_decls,
                ..
            } = &mut self.node_mut(target).kind
            {
                *prefix = None;
                *namespace = None;
                namespace_decls.clear();
                for attr in attributes.iter_mut() {
                    attr.prefix = None;
                    attr.namespace = None;
                }
            }
        }
    }

    /// Returns the total number of allocated nodes, detached ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node, in document order.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        let mut cursor = Some(current);
        self.next = None;
        while let Some(node) = cursor {
            if node == self.root {
                break;
            }
            if let Some(sibling) = self.doc.next_sibling(node) {
                self.next = Some(sibling);
                break;
            }
            cursor = self.doc.parent(node);
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(doc: &mut Document, name: &str) -> NodeId {
        doc.create_node(NodeKind::Element {
            name: name.to_string(),
            prefix: None,
            namespace: None,
            attributes: Vec::new(),
            namespace_decls: Vec::new(),
        })
    }

    fn text(doc: &mut Document, content: &str) -> NodeId {
        doc.create_node(NodeKind::Text {
            content: content.to_string(),
        })
    }

    /// `<ul><li>a</li>tail<li>b</li></ul>`
    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new(Flavor::Html);
        let ul = element(&mut doc, "ul");
        doc.append_child(doc.root(), ul);
        let li1 = element(&mut doc, "li");
        doc.append_child(ul, li1);
        let a = text(&mut doc, "a");
        doc.append_child(li1, a);
        let tail = text(&mut doc, "tail");
        doc.append_child(ul, tail);
        let li2 = element(&mut doc, "li");
        doc.append_child(ul, li2);
        let b = text(&mut doc, "b");
        doc.append_child(li2, b);
        (doc, ul, li1, li2)
    }

    #[test]
    fn test_new_document_has_root() {
        let doc = Document::new(Flavor::Xml);
        assert!(matches!(doc.node(doc.root()).kind, NodeKind::Document));
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.root_element(), None);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let (doc, ul, li1, li2) = sample();
        let names: Vec<_> = doc
            .descendants(ul)
            .filter_map(|id| doc.node_name(id))
            .collect();
        assert_eq!(names, vec!["li", "li"]);
        let all: Vec<_> = doc.descendants(doc.root()).collect();
        assert_eq!(all.len(), 6);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
        assert!(li1 < li2);
    }

    #[test]
    fn test_descendants_stay_inside_subtree() {
        let (doc, _, li1, _) = sample();
        let inside: Vec<_> = doc.descendants(li1).collect();
        assert_eq!(inside.len(), 1);
        assert_eq!(doc.text_content(inside[0]), "a");
    }

    #[test]
    fn test_text_content_and_leading_text() {
        let (doc, ul, li1, _) = sample();
        assert_eq!(doc.text_content(ul), "atailb");
        assert_eq!(doc.leading_text(li1).as_deref(), Some("a"));
        assert_eq!(doc.leading_text(ul), None);
    }

    #[test]
    fn test_remove_with_tail_drops_following_text() {
        let (mut doc, ul, li1, _) = sample();
        doc.remove_with_tail(li1);
        assert_eq!(doc.text_content(ul), "b");
        assert_eq!(doc.parent(li1), None);
    }

    #[test]
    fn test_drop_tree_keeps_tail() {
        let (mut doc, ul, _, li2) = sample();
        doc.drop_tree(li2);
        assert_eq!(doc.text_content(ul), "atail");
        assert_eq!(doc.last_child(ul).map(|id| doc.text_content(id)).as_deref(), Some("tail"));
    }

    #[test]
    fn test_drop_tree_merges_adjacent_text() {
        let mut doc = Document::new(Flavor::Html);
        let p = element(&mut doc, "p");
        doc.append_child(doc.root(), p);
        let before = text(&mut doc, "one ");
        doc.append_child(p, before);
        let b = element(&mut doc, "b");
        doc.append_child(p, b);
        let after = text(&mut doc, "two");
        doc.append_child(p, after);
        doc.drop_tree(b);
        assert_eq!(doc.children(p).count(), 1);
        assert_eq!(doc.text_content(p), "one two");
    }

    #[test]
    fn test_strip_namespaces() {
        let mut doc = Document::new(Flavor::Xml);
        let root = doc.create_node(NodeKind::Element {
            name: "feed".to_string(),
            prefix: None,
            namespace: Some("http://www.w3.org/2005/Atom".to_string()),
            attributes: vec![Attribute {
                name: "lang".to_string(),
                value: "en".to_string(),
                prefix: Some("xml".to_string()),
                namespace: Some(XML_NAMESPACE.to_string()),
            }],
            namespace_decls: vec![NamespaceDecl {
                prefix: None,
                uri: "http://www.w3.org/2005/Atom".to_string(),
            }],
        });
        doc.append_child(doc.root(), root);
        doc.strip_namespaces(root);
        assert_eq!(doc.node_namespace(root), None);
        assert_eq!(doc.attribute(root, "lang"), Some("en"));
        assert!(doc.namespace_decls(root).is_empty());
    }

    #[test]
    fn test_element_by_id_uses_flavor() {
        let mut doc = Document::new(Flavor::Html);
        let div = doc.create_node(NodeKind::Element {
            name: "div".to_string(),
            prefix: None,
            namespace: None,
            attributes: vec![Attribute::new("id", "main")],
            namespace_decls: Vec::new(),
        });
        doc.append_child(doc.root(), div);
        assert_eq!(doc.element_by_id("main"), Some(div));
        assert_eq!(doc.element_by_id("other"), None);
    }

    #[test]
    fn test_in_scope_namespaces_inner_wins() {
        let mut doc = Document::new(Flavor::Xml);
        let outer = element(&mut doc, "a");
        if let NodeKind::Element {
            namespace_decls, ..
        } = &mut doc.node_mut(outer).kind
        {
            namespace_decls.push(NamespaceDecl {
                prefix: Some("p".to_string()),
                uri: "urn:outer".to_string(),
            });
        }
        doc.append_child(doc.root(), outer);
        let inner = element(&mut doc, "b");
        if let NodeKind::Element {
            namespace_decls, ..
        } = &mut doc.node_mut(inner).kind
        {
            namespace_decls.push(NamespaceDecl {
                prefix: Some("p".to_string()),
                uri: "urn:inner".to_string(),
            });
        }
        doc.append_child(outer, inner);
        let scope = doc.in_scope_namespaces(inner);
        assert_eq!(scope.len(), 1);
        assert_eq!(scope[0].uri, "urn:inner");
    }
}
