//! Document construction for HTML and XML input.
//!
//! XML goes through a recovering tree builder driven by `quick-xml`
//! events ([`parse_xml`]); HTML goes through the HTML5 tree builder in
//! [`crate::html`]. Both produce the same arena [`Document`] and share
//! the input normalization and size limits defined here.
//!
//! Neither builder ever fails: malformed input yields the best tree that
//! could be recovered, and input without any element becomes `<html/>`.

mod xml;

use std::borrow::Cow;

use crate::tree::{Document, NodeKind};

/// Maximum element nesting depth enforced by the size guard.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Maximum text node length in bytes enforced by the size guard.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10_000_000;

/// Options controlling how documents are built.
///
/// ```
/// use seloxide::parser::ParseOptions;
///
/// let opts = ParseOptions::default().size_guard(true).max_depth(64);
/// assert!(opts.size_guard);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// If true, content nested deeper than `max_depth` or text longer than
    /// `max_text_length` is dropped.
    pub size_guard: bool,
    /// Maximum element nesting depth under the guard.
    pub max_depth: usize,
    /// Maximum length in bytes of a single text node under the guard.
    pub max_text_length: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            size_guard: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

impl ParseOptions {
    /// Enables or disables the size guard.
    #[must_use]
    pub fn size_guard(mut self, yes: bool) -> Self {
        self.size_guard = yes;
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum text node length in bytes.
    #[must_use]
    pub fn max_text_length(mut self, max: usize) -> Self {
        self.max_text_length = max;
        self
    }
}

/// Parses XML with default options.
#[must_use]
pub fn parse_xml(input: &str) -> Document {
    parse_xml_with(input, &ParseOptions::default())
}

/// Parses XML with the given options.
///
/// DTD entities are never expanded. References to entities other than
/// the five predefined ones are kept as entity reference nodes.
#[must_use]
pub fn parse_xml_with(input: &str, options: &ParseOptions) -> Document {
    let input = normalize_input(input);
    xml::TreeBuilder::new(options).build(&input)
}

/// The document substituted for empty input.
pub(crate) const EMPTY_DOCUMENT: &str = "<html/>";

/// Trims surrounding whitespace and removes NUL characters. Input left
/// empty becomes [`EMPTY_DOCUMENT`].
pub(crate) fn normalize_input(input: &str) -> Cow<'_, str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Cow::Borrowed(EMPTY_DOCUMENT);
    }
    if trimmed.contains('\0') {
        let cleaned = trimmed.replace('\0', "");
        if cleaned.trim().is_empty() {
            return Cow::Borrowed(EMPTY_DOCUMENT);
        }
        return Cow::Owned(cleaned);
    }
    Cow::Borrowed(trimmed)
}

/// Appends an empty `<html/>` root when the builder produced no element.
pub(crate) fn ensure_root_element(doc: &mut Document) {
    if doc.root_element().is_some() {
        return;
    }
    tracing::debug!("input produced no root element, using <html/>");
    let html = doc.create_node(NodeKind::Element {
        name: "html".to_owned(),
        prefix: None,
        namespace: None,
        attributes: Vec::new(),
        namespace_decls: Vec::new(),
    });
    doc.append_child(doc.root(), html);
}

/// Enforces [`ParseOptions`] limits while a tree is built and reports the
/// first time content is dropped.
pub(crate) struct SizeGuard<'o> {
    options: &'o ParseOptions,
    tripped: bool,
}

impl<'o> SizeGuard<'o> {
    pub(crate) fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            tripped: false,
        }
    }

    /// Returns `true` if an element at `depth` (1 for the root element)
    /// must be dropped.
    pub(crate) fn too_deep(&mut self, depth: usize) -> bool {
        if self.options.size_guard && depth > self.options.max_depth {
            self.trip("element nesting");
            return true;
        }
        false
    }

    /// Cuts `text` down to the text length limit.
    pub(crate) fn clamp_text(&mut self, mut text: String) -> String {
        if !self.options.size_guard || text.len() <= self.options.max_text_length {
            return text;
        }
        let mut end = self.options.max_text_length;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        self.trip("text length");
        text
    }

    fn trip(&mut self, limit: &str) {
        if !self.tripped {
            self.tripped = true;
            tracing::warn!(
                limit,
                "Input data is too big. Content past the size guard was dropped; \
                 disable size_guard to parse the document whole"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_input() {
        assert_eq!(normalize_input("  <a/>\n"), "<a/>");
        assert_eq!(normalize_input("<a>\0x</a>"), "<a>x</a>");
        assert_eq!(normalize_input(" \t "), "<html/>");
        assert_eq!(normalize_input("\0"), "<html/>");
    }

    #[test]
    fn test_parse_options_builder() {
        let opts = ParseOptions::default()
            .size_guard(true)
            .max_depth(3)
            .max_text_length(5);
        assert!(opts.size_guard);
        assert_eq!(opts.max_depth, 3);
        assert_eq!(opts.max_text_length, 5);
    }

    #[test]
    fn test_size_guard_clamps_text_on_char_boundary() {
        let opts = ParseOptions::default().size_guard(true).max_text_length(2);
        let mut guard = SizeGuard::new(&opts);
        assert_eq!(guard.clamp_text("héllo".to_string()), "h");
        assert!(guard.tripped);
    }

    #[test]
    fn test_size_guard_off_keeps_everything() {
        let opts = ParseOptions::default().max_depth(1);
        let mut guard = SizeGuard::new(&opts);
        assert!(!guard.too_deep(10));
        assert_eq!(guard.clamp_text("x".repeat(20)), "x".repeat(20));
    }
}
