//! `XPath` 1.0 query language implementation.
//!
//! This module implements `XPath` 1.0 (<https://www.w3.org/TR/xpath-10/>)
//! over the arena [`Document`], together with the extension points that
//! selections rely on: an unprefixed function registry (`has-class`,
//! `rel-id`) and the EXSLT `re:` and `set:` functions.
//!
//! # Quick Start
//!
//! ```
//! use seloxide::xpath::{evaluate, XPathNode, XPathValue};
//!
//! let mut doc = seloxide::parser::parse_xml("<root><a>1</a><b>2</b></root>");
//! let root = doc.root_element().unwrap();
//! let result = evaluate(&mut doc, XPathNode::Tree(root), "count(*)", &[]).unwrap();
//! assert!(matches!(result, XPathValue::Number(n) if n == 2.0));
//! ```
//!
//! # Known Limitations
//!
//! - The `namespace::` axis selects nothing; namespace nodes are not
//!   materialized.
//! - Names are matched exactly. An unprefixed name test only matches
//!   elements in no namespace, so default-namespaced XML needs a prefix.
//!
//! # Submodules
//!
//! - [`ast`]: Abstract syntax tree types for parsed expressions.
//! - [`lexer`]: Tokenizer for expression strings.
//! - [`types`]: Values, node handles and errors.
//! - [`parser`]: Recursive descent parser.
//! - [`eval`]: Expression evaluator.
//! - [`functions`]: The extension function registry.
//! - [`exslt`]: EXSLT regular expression and set functions.

pub mod ast;
pub mod eval;
pub mod exslt;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod types;

pub use eval::XPathContext;
pub use functions::{set_xpath_function, setup, XPathFunction};
pub use types::{XPathError, XPathNode, XPathValue};

use crate::tree::Document;

/// Parses and evaluates an expression in one call.
///
/// `namespaces` binds prefixes for the evaluation. To run the same
/// expression against many nodes, parse it once with [`parser::parse`]
/// and reuse it with [`XPathContext::evaluate`].
///
/// # Errors
///
/// Returns [`XPathError`] if the expression is malformed or evaluation fails.
pub fn evaluate(
    doc: &mut Document,
    context_node: XPathNode,
    expression: &str,
    namespaces: &[(&str, &str)],
) -> Result<XPathValue, XPathError> {
    let expr = parser::parse(expression)?;
    let mut ctx = XPathContext::new(doc, context_node);
    for (prefix, uri) in namespaces {
        ctx.set_namespace(prefix, uri);
    }
    ctx.evaluate(&expr)
}
