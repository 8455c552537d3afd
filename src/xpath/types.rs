//! `XPath` 1.0 value types, node handles and errors.
//!
//! The evaluator works on [`XPathNode`] handles rather than bare
//! [`NodeId`]s because attributes are selectable nodes in `XPath` but are
//! stored inline on their owner element in the tree.

use crate::tree::NodeId;
use std::cmp::Ordering;
use std::fmt;

// ---------------------------------------------------------------------------
// XPathNode
// ---------------------------------------------------------------------------

/// A node reachable by an `XPath` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XPathNode {
    /// A node stored in the document arena.
    Tree(NodeId),
    /// The attribute at `index` on element `owner`.
    Attribute {
        /// The element carrying the attribute.
        owner: NodeId,
        /// Position of the attribute in the owner's attribute list.
        index: usize,
    },
}

impl XPathNode {
    /// Returns the arena node this handle belongs to (the owner for
    /// attributes).
    #[must_use]
    pub fn anchor(self) -> NodeId {
        match self {
            Self::Tree(id) | Self::Attribute { owner: id, .. } => id,
        }
    }

    /// Returns the tree node id, or `None` for attributes.
    #[must_use]
    pub fn tree_node(self) -> Option<NodeId> {
        match self {
            Self::Tree(id) => Some(id),
            Self::Attribute { .. } => None,
        }
    }

    fn order_key(self) -> (NodeId, usize) {
        match self {
            Self::Tree(id) => (id, 0),
            Self::Attribute { owner, index } => (owner, index + 1),
        }
    }
}

// Arena ids follow document order, and an element's attributes sit between
// the element and its first child.
impl Ord for XPathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl PartialOrd for XPathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sorts a node list into document order and removes duplicates.
pub fn sort_document_order(nodes: &mut Vec<XPathNode>) {
    nodes.sort_unstable();
    nodes.dedup();
}

// ---------------------------------------------------------------------------
// XPathValue
// ---------------------------------------------------------------------------

/// An `XPath` 1.0 value: boolean, number, string or node-set.
#[derive(Debug, Clone)]
pub enum XPathValue {
    /// A boolean.
    Boolean(bool),
    /// An IEEE 754 double.
    Number(f64),
    /// A string.
    String(String),
    /// Nodes in document order, without duplicates.
    NodeSet(Vec<XPathNode>),
}

impl XPathValue {
    /// Converts the value to a boolean (`XPath` 1.0 section 4.3).
    #[must_use]
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::NodeSet(nodes) => !nodes.is_empty(),
        }
    }

    /// Returns the node-set, or `None` for scalar values.
    #[must_use]
    pub fn as_node_set(&self) -> Option<&[XPathNode]> {
        match self {
            Self::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Returns a name for the value's type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::NodeSet(_) => "node-set",
        }
    }
}

impl From<bool> for XPathValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for XPathValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for XPathValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for XPathValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for XPathValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ---------------------------------------------------------------------------
// Number conversions
// ---------------------------------------------------------------------------

/// Formats a number the way the `XPath` `string()` function does.
///
/// NaN is `NaN`, infinities are `Infinity`/`-Infinity`, integral values have
/// no decimal point and negative zero is `0`.
#[must_use]
pub fn format_xpath_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n.is_sign_positive() {
            "Infinity".to_owned()
        } else {
            "-Infinity".to_owned()
        };
    }
    if n == 0.0 {
        return "0".to_owned();
    }
    #[allow(clippy::cast_possible_truncation)]
    if n.fract() == 0.0 && n.abs() < 1e18 {
        return format!("{}", n as i64);
    }
    format!("{n}")
}

/// Parses a string with the `XPath` `number()` grammar.
///
/// Surrounding XML whitespace is allowed; the body must be an optional `-`
/// followed by digits with at most one decimal point. Anything else is NaN.
#[must_use]
pub fn parse_xpath_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    let body = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in body.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return f64::NAN,
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

// ---------------------------------------------------------------------------
// XPathError
// ---------------------------------------------------------------------------

/// An error raised while tokenizing, parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPathError {
    /// Human-readable error message.
    pub message: String,
    /// Byte offset of a syntax error, `None` for evaluation errors.
    pub position: Option<usize>,
}

impl XPathError {
    /// Creates a syntax error at the given byte offset.
    #[must_use]
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(position),
        }
    }

    /// Creates an evaluation error.
    #[must_use]
    pub fn eval(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    /// Returns `true` if the expression was rejected before evaluation.
    #[must_use]
    pub fn is_syntax_error(&self) -> bool {
        self.position.is_some()
    }
}

impl fmt::Display for XPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} at position {position}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for XPathError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_xpath_number() {
        assert_eq!(format_xpath_number(1.0), "1");
        assert_eq!(format_xpath_number(-0.0), "0");
        assert_eq!(format_xpath_number(1.5), "1.5");
        assert_eq!(format_xpath_number(f64::NAN), "NaN");
        assert_eq!(format_xpath_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_parse_xpath_number() {
        assert_eq!(parse_xpath_number(" 42 "), 42.0);
        assert_eq!(parse_xpath_number("-3.5"), -3.5);
        assert_eq!(parse_xpath_number(".5"), 0.5);
        assert!(parse_xpath_number("1e3").is_nan());
        assert!(parse_xpath_number("+1").is_nan());
        assert!(parse_xpath_number("").is_nan());
        assert!(parse_xpath_number("abc").is_nan());
    }

    #[test]
    fn test_boolean_conversion() {
        assert!(!XPathValue::Number(f64::NAN).to_boolean());
        assert!(XPathValue::String("0".to_string()).to_boolean());
        assert!(!XPathValue::NodeSet(Vec::new()).to_boolean());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            XPathError::new("unexpected token", 4).to_string(),
            "unexpected token at position 4"
        );
        assert_eq!(XPathError::eval("boom").to_string(), "boom");
        assert!(!XPathError::eval("boom").is_syntax_error());
    }
}
