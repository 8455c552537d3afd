//! Node type definitions.
//!
//! The `NodeKind` enum carries the payload of every node stored in a
//! [`Document`](super::Document) arena. Navigation links live in
//! [`NodeData`](super::NodeData), not here.

use super::{Attribute, NamespaceDecl};

/// The kind of a tree node and its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,

    /// An element node, e.g. `<div class="x">`.
    Element {
        /// The local name. HTML element names are lower-case.
        name: String,
        /// Namespace prefix as written in the source (`svg` in `svg:rect`).
        prefix: Option<String>,
        /// Resolved namespace URI, if any.
        namespace: Option<String>,
        /// Attributes in source order.
        attributes: Vec<Attribute>,
        /// Namespace declarations (`xmlns`, `xmlns:p`) made on this element.
        namespace_decls: Vec<NamespaceDecl>,
    },

    /// Character data.
    Text {
        /// Decoded text content.
        content: String,
    },

    /// A CDATA section. Behaves as text for querying.
    CData {
        /// The raw section content.
        content: String,
    },

    /// A comment, without the `<!--` and `-->` delimiters.
    Comment {
        /// The comment text.
        content: String,
    },

    /// A processing instruction, e.g. `<?target data?>`.
    ProcessingInstruction {
        /// The PI target.
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },

    /// An entity reference that was not expanded, e.g. `&xxe;`.
    ///
    /// XML input never expands entities declared in a DTD. References to
    /// them stay in the tree and serialize back verbatim.
    EntityRef {
        /// The entity name, without `&` and `;`.
        name: String,
    },

    /// A document type declaration.
    DocumentType {
        /// The declared root element name.
        name: String,
        /// The PUBLIC identifier, if any.
        public_id: Option<String>,
        /// The SYSTEM identifier, if any.
        system_id: Option<String>,
    },
}

impl NodeKind {
    /// Returns `true` for nodes selected by the `text()` node test.
    #[must_use]
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            Self::Text { .. } | Self::CData { .. } | Self::EntityRef { .. }
        )
    }

    /// Returns `true` for element nodes.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }
}
