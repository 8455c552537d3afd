//! Process-wide registry of unprefixed `XPath` extension functions.
//!
//! Every [`XPathContext`] takes a snapshot of the registry when it is
//! created, so registering or removing a function never affects an
//! evaluation already in progress. Register custom functions once at
//! startup, before queries run on other threads.
//!
//! Two functions are installed by default:
//!
//! - `has-class(name, ...)` is true when the context element's `class`
//!   attribute contains every given class name as a whole token;
//! - `rel-id(id, nodeset?)` behaves like `id(id)` but only returns the
//!   element when it lies inside `nodeset` (the context node by default).
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use seloxide::xpath::{set_xpath_function, XPathContext, XPathValue};
//!
//! set_xpath_function(
//!     "shout",
//!     Some(Arc::new(|ctx: &mut XPathContext<'_>, args: Vec<XPathValue>| {
//!         let text = args.first().map(|a| ctx.string(a)).unwrap_or_default();
//!         Ok(XPathValue::String(text.to_uppercase()))
//!     })),
//! );
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use super::eval::XPathContext;
use super::types::{sort_document_order, XPathError, XPathNode, XPathValue};

/// An extension function callable from `XPath` expressions.
///
/// Receives the evaluation context and the already evaluated arguments.
pub type XPathFunction =
    Arc<dyn Fn(&mut XPathContext<'_>, Vec<XPathValue>) -> Result<XPathValue, XPathError> + Send + Sync>;

static REGISTRY: Lazy<RwLock<HashMap<String, XPathFunction>>> =
    Lazy::new(|| RwLock::new(default_functions()));

/// HTML5 whitespace: space, tab, LF, FF and CR.
static HTML5_WHITESPACE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new("[ \t\n\r\x0c]+").expect("whitespace pattern is valid")
});

fn default_functions() -> HashMap<String, XPathFunction> {
    let mut functions: HashMap<String, XPathFunction> = HashMap::new();
    functions.insert("has-class".to_owned(), Arc::new(has_class));
    functions.insert("rel-id".to_owned(), Arc::new(rel_id));
    functions
}

/// Registers `function` under `name`, or removes the name when `function`
/// is `None`.
///
/// Names are unprefixed; they become callable as `name(...)` in every
/// expression evaluated afterwards.
pub fn set_xpath_function(name: &str, function: Option<XPathFunction>) {
    let mut registry = REGISTRY.write();
    match function {
        Some(function) => {
            tracing::debug!(name, "registering XPath extension function");
            registry.insert(name.to_owned(), function);
        }
        None => {
            if registry.remove(name).is_none() {
                tracing::debug!(name, "removing an XPath function that was not registered");
            }
        }
    }
}

/// Installs `has-class` and `rel-id`, replacing any function registered
/// under those names.
pub fn setup() {
    let mut registry = REGISTRY.write();
    registry.extend(default_functions());
}

/// Returns a copy of the registry for one evaluation.
pub(crate) fn snapshot() -> HashMap<String, XPathFunction> {
    REGISTRY.read().clone()
}

fn has_class(ctx: &mut XPathContext<'_>, args: Vec<XPathValue>) -> Result<XPathValue, XPathError> {
    const CHECKED: &str = "has-class.args-checked";
    if !ctx.is_marked(CHECKED) {
        if args.is_empty() {
            return Err(XPathError::eval("has-class must have at least 1 argument"));
        }
        if !args.iter().all(|a| matches!(a, XPathValue::String(_))) {
            return Err(XPathError::eval("has-class arguments must be strings"));
        }
        ctx.mark(CHECKED);
    }

    let XPathNode::Tree(node) = ctx.context_node() else {
        return Ok(XPathValue::Boolean(false));
    };
    let Some(class) = ctx.document().attribute(node, "class") else {
        return Ok(XPathValue::Boolean(false));
    };
    let tokens = HTML5_WHITESPACE.replace_all(&format!(" {class} "), " ").into_owned();
    let all = args.iter().all(|arg| match arg {
        XPathValue::String(name) => tokens.contains(&format!(" {name} ")),
        _ => false,
    });
    Ok(XPathValue::Boolean(all))
}

fn rel_id(ctx: &mut XPathContext<'_>, args: Vec<XPathValue>) -> Result<XPathValue, XPathError> {
    const CHECKED: &str = "rel-id.args-checked";
    if !ctx.is_marked(CHECKED) {
        if !matches!(args.first(), Some(XPathValue::String(_))) {
            return Err(XPathError::eval("rel-id: first argument must be a string"));
        }
        if args.get(1).is_some_and(|a| a.as_node_set().is_none()) {
            return Err(XPathError::eval("rel-id: second argument must be a nodeset"));
        }
        ctx.mark(CHECKED);
    }

    let id = match args.first() {
        Some(value) => ctx.string(value),
        None => String::new(),
    };
    let scope: Vec<XPathNode> = match args.get(1).and_then(XPathValue::as_node_set) {
        Some(nodes) => nodes.to_vec(),
        None => vec![ctx.context_node()],
    };

    let doc = ctx.document();
    let mut result: Vec<XPathNode> = id
        .split_ascii_whitespace()
        .filter_map(|token| doc.element_by_id(token))
        .map(XPathNode::Tree)
        .collect();
    sort_document_order(&mut result);

    let Some(first) = result.first().copied() else {
        return Ok(XPathValue::NodeSet(result));
    };
    let inside = result.iter().any(|n| scope.contains(n))
        || doc
            .ancestors(first.anchor())
            .skip(1)
            .any(|a| scope.contains(&XPathNode::Tree(a)));
    if inside {
        Ok(XPathValue::NodeSet(result))
    } else {
        Ok(XPathValue::NodeSet(Vec::new()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::xpath::parser::parse;

    fn count(html: &str, expr: &str) -> usize {
        let mut doc = parse_html(html);
        let root = doc.root();
        let mut ctx = XPathContext::new(&mut doc, XPathNode::Tree(root));
        match ctx.evaluate(&parse(expr).unwrap()).unwrap() {
            XPathValue::NodeSet(nodes) => nodes.len(),
            other => panic!("expected node-set, got {other:?}"),
        }
    }

    fn eval_err(html: &str, expr: &str) -> XPathError {
        let mut doc = parse_html(html);
        let root = doc.root();
        let mut ctx = XPathContext::new(&mut doc, XPathNode::Tree(root));
        ctx.evaluate(&parse(expr).unwrap()).unwrap_err()
    }

    #[test]
    fn test_has_class_whole_tokens() {
        let html = r#"<p class="foo bar">1</p><p class="foobar">2</p><p>3</p>"#;
        assert_eq!(count(html, "//p[has-class('foo')]"), 1);
        assert_eq!(count(html, "//p[has-class('foo', 'bar')]"), 1);
        assert_eq!(count(html, "//p[has-class('foo', 'baz')]"), 0);
        assert_eq!(count(html, "//p[has-class('foobar')]"), 1);
    }

    #[test]
    fn test_has_class_html5_whitespace() {
        let html = "<p class=\"foo\tbar\">1</p><p class=\"foo\nbar\">2</p><p class=\"\x0cfoo\">3</p>";
        assert_eq!(count(html, "//p[has-class('foo')]"), 3);
        assert_eq!(count(html, "//p[has-class('bar')]"), 2);
    }

    #[test]
    fn test_has_class_argument_errors() {
        let html = "<p class='a'>x</p>";
        assert_eq!(
            eval_err(html, "//p[has-class()]").message,
            "has-class must have at least 1 argument"
        );
        assert_eq!(
            eval_err(html, "//p[has-class(1)]").message,
            "has-class arguments must be strings"
        );
    }

    #[test]
    fn test_has_class_arguments_checked_once_per_evaluation() {
        let html = "<p class='a'>1</p><p class='b'>2</p>";
        let mut doc = parse_html(html);
        let root = doc.root();
        let mut ctx = XPathContext::new(&mut doc, XPathNode::Tree(root));
        let expr = parse("//p[has-class('a') or has-class(1)]").unwrap();
        match ctx.evaluate(&expr).unwrap() {
            XPathValue::NodeSet(nodes) => assert_eq!(nodes.len(), 1),
            other => panic!("expected node-set, got {other:?}"),
        }
        let err = ctx.evaluate(&parse("has-class(1)").unwrap()).unwrap_err();
        assert_eq!(err.message, "has-class arguments must be strings");
    }

    #[test]
    fn test_rel_id_scoping() {
        let html = r#"<div id="outer"><p id="inner">x</p></div><div id="other"></div>"#;
        assert_eq!(count(html, "rel-id('inner', id('outer'))"), 1);
        assert_eq!(count(html, "rel-id('inner', id('other'))"), 0);
        assert_eq!(count(html, "rel-id('inner', id('inner'))"), 1);
        assert_eq!(count(html, "rel-id('missing', id('outer'))"), 0);
        assert_eq!(count(html, "//div[rel-id('inner')]"), 1);
    }

    #[test]
    fn test_rel_id_argument_errors() {
        let html = r#"<p id="a">x</p>"#;
        assert_eq!(
            eval_err(html, "rel-id(1)").message,
            "rel-id: first argument must be a string"
        );
        assert_eq!(
            eval_err(html, "rel-id('a', 'b')").message,
            "rel-id: second argument must be a nodeset"
        );
    }

    #[test]
    fn test_registry_snapshot_sees_defaults() {
        let functions = snapshot();
        assert!(functions.contains_key("has-class"));
        assert!(functions.contains_key("rel-id"));
    }

    #[test]
    fn test_setup_reinstalls_defaults() {
        setup();
        setup();
        assert_eq!(count("<p class='a'>x</p>", "//p[has-class('a')]"), 1);
        assert!(snapshot().contains_key("rel-id"));
    }
}
