//! EXSLT regular expression and set functions.
//!
//! These are reached through prefixed calls whose prefix maps to
//! [`REGEXP_NAMESPACE`] or [`SETS_NAMESPACE`]. Selections bind `re` and
//! `set` to those namespaces by default.
//!
//! Patterns use the `regex` crate syntax. Flags are a string where `i`
//! makes the match case-insensitive and `g` makes `re:match` and
//! `re:replace` global.

use regex::{Regex, RegexBuilder};

use crate::tree::NodeKind;

use super::eval::XPathContext;
use super::types::{XPathError, XPathNode, XPathValue};

/// Namespace URI of the EXSLT regular expression functions.
pub const REGEXP_NAMESPACE: &str = "http://exslt.org/regular-expressions";

/// Namespace URI of the EXSLT set functions.
pub const SETS_NAMESPACE: &str = "http://exslt.org/sets";

/// Calls the EXSLT function `local` from namespace `uri`.
///
/// Returns `None` when the namespace has no function of that name.
pub(crate) fn call(
    ctx: &mut XPathContext<'_>,
    uri: &str,
    local: &str,
    args: Vec<XPathValue>,
) -> Option<Result<XPathValue, XPathError>> {
    match (uri, local) {
        (REGEXP_NAMESPACE, "test") => Some(re_test(ctx, &args)),
        (REGEXP_NAMESPACE, "match") => Some(re_match(ctx, &args)),
        (REGEXP_NAMESPACE, "replace") => Some(re_replace(ctx, &args)),
        (SETS_NAMESPACE, "difference") => Some(set_pair(&args, "difference").map(|(a, b)| {
            XPathValue::NodeSet(a.iter().filter(|n| !b.contains(n)).copied().collect())
        })),
        (SETS_NAMESPACE, "intersection") => Some(set_pair(&args, "intersection").map(|(a, b)| {
            XPathValue::NodeSet(a.iter().filter(|n| b.contains(n)).copied().collect())
        })),
        (SETS_NAMESPACE, "has-same-node") => Some(
            set_pair(&args, "has-same-node")
                .map(|(a, b)| XPathValue::Boolean(a.iter().any(|n| b.contains(n)))),
        ),
        (SETS_NAMESPACE, "leading") => Some(set_pair(&args, "leading").map(|(a, b)| {
            XPathValue::NodeSet(match b.first() {
                None => a.to_vec(),
                Some(first) if a.contains(first) => {
                    a.iter().filter(|n| *n < first).copied().collect()
                }
                Some(_) => Vec::new(),
            })
        })),
        (SETS_NAMESPACE, "trailing") => Some(set_pair(&args, "trailing").map(|(a, b)| {
            XPathValue::NodeSet(match b.first() {
                None => a.to_vec(),
                Some(first) if a.contains(first) => {
                    a.iter().filter(|n| *n > first).copied().collect()
                }
                Some(_) => Vec::new(),
            })
        })),
        (SETS_NAMESPACE, "distinct") => Some(set_distinct(ctx, &args)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// re:
// ---------------------------------------------------------------------------

/// Reads `(string, pattern, flags)` from the first three arguments.
fn regex_args(
    ctx: &XPathContext<'_>,
    args: &[XPathValue],
    name: &str,
    min: usize,
) -> Result<(String, Regex, String), XPathError> {
    if args.len() < min || args.len() > 3 {
        return Err(XPathError::eval(format!(
            "re:{name}() called with {} arguments",
            args.len()
        )));
    }
    let input = ctx.string(&args[0]);
    let pattern = ctx.string(&args[1]);
    let flags = args.get(2).map(|f| ctx.string(f)).unwrap_or_default();
    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(flags.contains('i'))
        .build()
        .map_err(|e| XPathError::eval(format!("re:{name}(): invalid pattern {pattern:?}: {e}")))?;
    Ok((input, regex, flags))
}

fn re_test(ctx: &XPathContext<'_>, args: &[XPathValue]) -> Result<XPathValue, XPathError> {
    let (input, regex, _) = regex_args(ctx, args, "test", 2)?;
    Ok(XPathValue::Boolean(regex.is_match(&input)))
}

fn re_match(ctx: &mut XPathContext<'_>, args: &[XPathValue]) -> Result<XPathValue, XPathError> {
    let (input, regex, flags) = regex_args(ctx, args, "match", 2)?;
    let texts: Vec<String> = if flags.contains('g') {
        regex
            .captures_iter(&input)
            .map(|caps| {
                let group = if caps.len() > 1 { caps.get(1) } else { caps.get(0) };
                group.map(|m| m.as_str().to_owned()).unwrap_or_default()
            })
            .collect()
    } else {
        match regex.captures(&input) {
            Some(caps) => caps
                .iter()
                .map(|m| m.map(|m| m.as_str().to_owned()).unwrap_or_default())
                .collect(),
            None => Vec::new(),
        }
    };
    if texts.is_empty() {
        return Ok(XPathValue::NodeSet(Vec::new()));
    }

    let doc = ctx.document_mut();
    let matches = doc.create_node(element("matches"));
    let mut nodes = Vec::with_capacity(texts.len());
    for text in texts {
        let node = doc.create_node(element("match"));
        doc.append_child(matches, node);
        if !text.is_empty() {
            let content = doc.create_node(NodeKind::Text { content: text });
            doc.append_child(node, content);
        }
        nodes.push(XPathNode::Tree(node));
    }
    Ok(XPathValue::NodeSet(nodes))
}

fn re_replace(ctx: &XPathContext<'_>, args: &[XPathValue]) -> Result<XPathValue, XPathError> {
    if args.len() != 4 {
        return Err(XPathError::eval(format!(
            "re:replace() called with {} arguments",
            args.len()
        )));
    }
    let (input, regex, flags) = regex_args(ctx, &args[..3], "replace", 3)?;
    let replacement = expand_backreferences(&ctx.string(&args[3]));
    let limit = if flags.contains('g') { 0 } else { 1 };
    Ok(XPathValue::String(
        regex
            .replacen(&input, limit, replacement.as_str())
            .into_owned(),
    ))
}

/// Rewrites `\1`-style back-references into `${1}` and escapes literal `$`.
fn expand_backreferences(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut group = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        group.push(d);
                        chars.next();
                    }
                    out.push_str(&format!("${{{group}}}"));
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            _ => out.push(c),
        }
    }
    out
}

fn element(name: &str) -> NodeKind {
    NodeKind::Element {
        name: name.to_owned(),
        prefix: None,
        namespace: None,
        attributes: Vec::new(),
        namespace_decls: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// set:
// ---------------------------------------------------------------------------

fn set_pair<'v>(
    args: &'v [XPathValue],
    name: &str,
) -> Result<(&'v [XPathNode], &'v [XPathNode]), XPathError> {
    match args {
        [a, b] => match (a.as_node_set(), b.as_node_set()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(XPathError::eval(format!("set:{name}() expects two node-sets"))),
        },
        _ => Err(XPathError::eval(format!(
            "set:{name}() called with {} arguments",
            args.len()
        ))),
    }
}

fn set_distinct(ctx: &XPathContext<'_>, args: &[XPathValue]) -> Result<XPathValue, XPathError> {
    let [arg] = args else {
        return Err(XPathError::eval(format!(
            "set:distinct() called with {} arguments",
            args.len()
        )));
    };
    let nodes = arg
        .as_node_set()
        .ok_or_else(|| XPathError::eval("set:distinct() expects a node-set"))?;
    let mut seen = std::collections::HashSet::new();
    Ok(XPathValue::NodeSet(
        nodes
            .iter()
            .filter(|&&n| seen.insert(ctx.string_value(n)))
            .copied()
            .collect(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::parse_xml;
    use crate::xpath::parser::parse;

    fn eval(xml: &str, expr: &str) -> Vec<String> {
        let mut doc = parse_xml(xml);
        let root = doc.root();
        let mut ctx = XPathContext::new(&mut doc, XPathNode::Tree(root));
        ctx.set_namespace("re", REGEXP_NAMESPACE);
        ctx.set_namespace("set", SETS_NAMESPACE);
        let value = ctx.evaluate(&parse(expr).unwrap()).unwrap();
        match &value {
            XPathValue::NodeSet(nodes) => nodes.iter().map(|&n| ctx.string_value(n)).collect(),
            other => vec![ctx.string(other)],
        }
    }

    #[test]
    fn test_re_test_flags() {
        let xml = "<r><a>Foo</a><a>bar</a></r>";
        assert_eq!(eval(xml, "//a[re:test(., '^f')]"), Vec::<String>::new());
        assert_eq!(eval(xml, "//a[re:test(., '^f', 'i')]"), vec!["Foo"]);
        assert_eq!(eval(xml, "//a[re:test(., 'a')]"), vec!["bar"]);
    }

    #[test]
    fn test_re_match_groups() {
        assert_eq!(
            eval("<r/>", "re:match('2024-05', '(\\d+)-(\\d+)')"),
            vec!["2024-05", "2024", "05"]
        );
        assert_eq!(
            eval("<r/>", "re:match('a1 b2 c3', '[a-z](\\d)', 'g')"),
            vec!["1", "2", "3"]
        );
        assert_eq!(eval("<r/>", "count(re:match('abc', 'x'))"), vec!["0"]);
        assert_eq!(eval("<r/>", "re:match('ab', 'a(x)?b')"), vec!["ab", ""]);
    }

    #[test]
    fn test_re_match_nodes_are_detached() {
        let mut doc = parse_xml("<r><a>x1</a></r>");
        let before = doc.descendants(doc.root()).count();
        let root = doc.root();
        let mut ctx = XPathContext::new(&mut doc, XPathNode::Tree(root));
        ctx.set_namespace("re", REGEXP_NAMESPACE);
        ctx.evaluate(&parse("re:match(//a, '\\d')").unwrap()).unwrap();
        assert_eq!(doc.descendants(doc.root()).count(), before);
    }

    #[test]
    fn test_re_replace() {
        assert_eq!(
            eval("<r/>", "re:replace('a-b-c', '-', '', '+')"),
            vec!["a+b-c"]
        );
        assert_eq!(
            eval("<r/>", "re:replace('a-b-c', '-', 'g', '+')"),
            vec!["a+b+c"]
        );
        assert_eq!(
            eval("<r/>", "re:replace('John Smith', '(\\w+) (\\w+)', '', '\\2 $\\1')"),
            vec!["Smith $John"]
        );
    }

    #[test]
    fn test_set_functions() {
        let xml = "<r><a>1</a><a>2</a><a>1</a><b>3</b></r>";
        assert_eq!(eval(xml, "set:distinct(//a)"), vec!["1", "2"]);
        assert_eq!(eval(xml, "set:difference(//a, //a[2])"), vec!["1", "1"]);
        assert_eq!(eval(xml, "set:intersection(//a, //a[. = '2'])"), vec!["2"]);
        assert_eq!(eval(xml, "set:has-same-node(//a, //b)"), vec!["false"]);
        assert_eq!(eval(xml, "set:leading(//a, //a[2])"), vec!["1"]);
        assert_eq!(eval(xml, "set:trailing(//a, //a[2])"), vec!["1"]);
        assert_eq!(eval(xml, "count(set:leading(//a, //b))"), vec!["0"]);
    }

    #[test]
    fn test_expand_backreferences() {
        assert_eq!(expand_backreferences("\\1-\\12"), "${1}-${12}");
        assert_eq!(expand_backreferences("cost $5"), "cost $$5");
        assert_eq!(expand_backreferences("a\\\\b"), "a\\b");
    }
}
