//! `XPath` 1.0 expression evaluator.
//!
//! Evaluates a parsed [`Expr`] against the arena [`Document`]. The context
//! holds a mutable borrow of the document because extension functions such
//! as `re:match` return freshly built element nodes; those nodes are
//! allocated detached, so the queried tree itself is never changed.
//!
//! Function calls resolve in this order:
//!
//! 1. prefixed names (`re:test`) through the namespace table to the EXSLT
//!    implementations in [`super::exslt`];
//! 2. the core `XPath` 1.0 library;
//! 3. the process-wide extension registry (see [`super::functions`]),
//!    snapshotted when the context is created.

use std::collections::{HashMap, HashSet};

use crate::tree::{Document, NodeId, NodeKind, XML_NAMESPACE};

use super::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use super::exslt;
use super::functions::{self, XPathFunction};
use super::types::{
    format_xpath_number, parse_xpath_number, sort_document_order, XPathError, XPathNode,
    XPathValue,
};

/// The context node together with its position and the size of the
/// node-set it was taken from.
#[derive(Debug, Clone, Copy)]
struct Focus {
    node: XPathNode,
    position: usize,
    size: usize,
}

/// Evaluation context for `XPath` expressions.
///
/// # Examples
///
/// ```
/// use seloxide::xpath::eval::XPathContext;
/// use seloxide::xpath::parser::parse;
/// use seloxide::xpath::XPathNode;
///
/// let mut doc = seloxide::html::parse_html("<ul><li>a</li><li>b</li></ul>");
/// let root = doc.root();
/// let expr = parse("count(//li)").unwrap();
/// let mut ctx = XPathContext::new(&mut doc, XPathNode::Tree(root));
/// let result = ctx.evaluate(&expr).unwrap();
/// assert_eq!(ctx.number(&result), 2.0);
/// ```
pub struct XPathContext<'a> {
    doc: &'a mut Document,
    focus: Focus,
    namespaces: HashMap<String, String>,
    variables: HashMap<String, XPathValue>,
    functions: HashMap<String, XPathFunction>,
    marks: HashSet<String>,
}

impl<'a> XPathContext<'a> {
    /// Creates a context positioned on `node`, with the extension
    /// functions registered at this moment.
    #[must_use]
    pub fn new(doc: &'a mut Document, node: XPathNode) -> Self {
        Self {
            doc,
            focus: Focus {
                node,
                position: 1,
                size: 1,
            },
            namespaces: HashMap::new(),
            variables: HashMap::new(),
            functions: functions::snapshot(),
            marks: HashSet::new(),
        }
    }

    /// Binds a namespace prefix for name tests and prefixed function calls.
    pub fn set_namespace(&mut self, prefix: &str, uri: &str) {
        self.namespaces.insert(prefix.to_owned(), uri.to_owned());
    }

    /// Binds `$name` to a value.
    pub fn set_variable(&mut self, name: &str, value: XPathValue) {
        self.variables.insert(name.to_owned(), value);
    }

    /// Evaluates an expression against the context node.
    ///
    /// Marks set by extension functions are cleared first, so each call
    /// is a fresh evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError`] for undefined variables or prefixes, unknown
    /// functions, wrongly typed arguments and errors raised by extension
    /// functions.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<XPathValue, XPathError> {
        self.marks.clear();
        self.eval_expr(expr)
    }

    // -----------------------------------------------------------------------
    // Accessors for extension functions
    // -----------------------------------------------------------------------

    /// Returns the document being queried.
    #[must_use]
    pub fn document(&self) -> &Document {
        &*self.doc
    }

    /// Returns the document for allocating result nodes.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut *self.doc
    }

    /// Returns the current context node.
    #[must_use]
    pub fn context_node(&self) -> XPathNode {
        self.focus.node
    }

    /// Looks up a namespace prefix bound for this evaluation.
    #[must_use]
    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Returns `true` if `key` was marked earlier in this evaluation.
    #[must_use]
    pub fn is_marked(&self, key: &str) -> bool {
        self.marks.contains(key)
    }

    /// Marks `key` for the rest of this evaluation.
    pub fn mark(&mut self, key: &str) {
        self.marks.insert(key.to_owned());
    }

    /// Returns the string-value of a node.
    #[must_use]
    pub fn string_value(&self, node: XPathNode) -> String {
        match node {
            XPathNode::Tree(id) => self.doc.text_content(id),
            XPathNode::Attribute { owner, index } => self
                .doc
                .attributes(owner)
                .get(index)
                .map(|a| a.value.clone())
                .unwrap_or_default(),
        }
    }

    /// Converts a value with the `string()` rules.
    #[must_use]
    pub fn string(&self, value: &XPathValue) -> String {
        match value {
            XPathValue::Boolean(b) => if *b { "true" } else { "false" }.to_owned(),
            XPathValue::Number(n) => format_xpath_number(*n),
            XPathValue::String(s) => s.clone(),
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|&n| self.string_value(n))
                .unwrap_or_default(),
        }
    }

    /// Converts a value with the `number()` rules.
    #[must_use]
    pub fn number(&self, value: &XPathValue) -> f64 {
        match value {
            XPathValue::Boolean(b) => f64::from(u8::from(*b)),
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => parse_xpath_number(s),
            XPathValue::NodeSet(_) => parse_xpath_number(&self.string(value)),
        }
    }

    // -----------------------------------------------------------------------
    // Expression dispatch
    // -----------------------------------------------------------------------

    fn eval_expr(&mut self, expr: &Expr) -> Result<XPathValue, XPathError> {
        match expr {
            Expr::Number(n) => Ok(XPathValue::Number(*n)),
            Expr::String(s) => Ok(XPathValue::String(s.clone())),
            Expr::Variable(name) => self
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| XPathError::eval(format!("Undefined variable ${name}"))),
            Expr::BinaryOp { op, left, right } => self.eval_binary_op(*op, left, right),
            Expr::UnaryNeg(inner) => {
                let value = self.eval_expr(inner)?;
                Ok(XPathValue::Number(-self.number(&value)))
            }
            Expr::FunctionCall { name, args } => self.eval_function(name, args),
            Expr::Path { absolute, steps } => {
                let start = if *absolute {
                    let anchor = self.focus.node.anchor();
                    let top = self.doc.ancestors(anchor).last().unwrap_or(anchor);
                    XPathNode::Tree(top)
                } else {
                    self.focus.node
                };
                self.eval_steps(vec![start], steps)
            }
            Expr::Filter { expr, predicates } => {
                let mut nodes = self.eval_node_set(expr, "filter expression")?;
                for predicate in predicates {
                    nodes = self.apply_predicate(nodes, predicate)?;
                }
                Ok(XPathValue::NodeSet(nodes))
            }
            Expr::FilterPath { filter, steps } => {
                let nodes = self.eval_node_set(filter, "path start")?;
                self.eval_steps(nodes, steps)
            }
            Expr::Union(left, right) => {
                let mut nodes = self.eval_node_set(left, "union operand")?;
                nodes.extend(self.eval_node_set(right, "union operand")?);
                sort_document_order(&mut nodes);
                Ok(XPathValue::NodeSet(nodes))
            }
        }
    }

    fn eval_node_set(&mut self, expr: &Expr, what: &str) -> Result<Vec<XPathNode>, XPathError> {
        match self.eval_expr(expr)? {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::eval(format!(
                "{what} must be a node-set, found {}",
                other.type_name()
            ))),
        }
    }

    #[allow(clippy::float_cmp)]
    fn eval_binary_op(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<XPathValue, XPathError> {
        match op {
            BinaryOp::Or => {
                if self.eval_expr(left)?.to_boolean() {
                    return Ok(XPathValue::Boolean(true));
                }
                Ok(XPathValue::Boolean(self.eval_expr(right)?.to_boolean()))
            }
            BinaryOp::And => {
                if !self.eval_expr(left)?.to_boolean() {
                    return Ok(XPathValue::Boolean(false));
                }
                Ok(XPathValue::Boolean(self.eval_expr(right)?.to_boolean()))
            }
            BinaryOp::Eq | BinaryOp::Neq => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                Ok(XPathValue::Boolean(self.compare_equality(op, &lhs, &rhs)))
            }
            BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                Ok(XPathValue::Boolean(self.compare_relational(op, &lhs, &rhs)))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                let (a, b) = (self.number(&lhs), self.number(&rhs));
                Ok(XPathValue::Number(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                }))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Location steps
    // -----------------------------------------------------------------------

    fn eval_steps(
        &mut self,
        mut nodes: Vec<XPathNode>,
        steps: &[Step],
    ) -> Result<XPathValue, XPathError> {
        for step in steps {
            nodes = self.apply_step(&nodes, step)?;
        }
        Ok(XPathValue::NodeSet(nodes))
    }

    fn apply_step(
        &mut self,
        input: &[XPathNode],
        step: &Step,
    ) -> Result<Vec<XPathNode>, XPathError> {
        let uri = match &step.node_test {
            NodeTest::Name {
                prefix: Some(prefix),
                ..
            }
            | NodeTest::PrefixWildcard(prefix) => Some(self.resolve_prefix(prefix)?),
            _ => None,
        };

        let descending = step.predicates.is_empty()
            && matches!(step.axis, Axis::Descendant | Axis::DescendantOrSelf);
        let mut covered: Option<NodeId> = None;
        let mut result = Vec::new();
        for &node in input {
            // A subtree already walked by a predicate-free descendant step
            // contributes nothing new.
            if descending {
                if let (Some(root), XPathNode::Tree(id)) = (covered, node) {
                    if self.doc.ancestors(id).any(|a| a == root) {
                        continue;
                    }
                }
                covered = node.tree_node();
            }

            let candidates: Vec<XPathNode> = self
                .axis_nodes(node, step.axis)
                .into_iter()
                .filter(|&n| self.matches_test(n, &step.node_test, uri.as_deref(), step.axis))
                .collect();
            let mut selected = candidates;
            for predicate in &step.predicates {
                selected = self.apply_predicate(selected, predicate)?;
            }
            result.extend(selected);
        }
        sort_document_order(&mut result);
        Ok(result)
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<String, XPathError> {
        if prefix == "xml" {
            return Ok(XML_NAMESPACE.to_owned());
        }
        self.namespaces
            .get(prefix)
            .cloned()
            .ok_or_else(|| XPathError::eval(format!("Undefined namespace prefix '{prefix}'")))
    }

    /// Filters `nodes`, taken in proximity order, by one predicate.
    fn apply_predicate(
        &mut self,
        nodes: Vec<XPathNode>,
        predicate: &Expr,
    ) -> Result<Vec<XPathNode>, XPathError> {
        let saved = self.focus;
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in nodes.into_iter().enumerate() {
            self.focus = Focus {
                node,
                position: i + 1,
                size,
            };
            let outcome = self.eval_expr(predicate);
            let value = match outcome {
                Ok(value) => value,
                Err(err) => {
                    self.focus = saved;
                    return Err(err);
                }
            };
            #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
            let keep = match value {
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_boolean(),
            };
            if keep {
                kept.push(node);
            }
        }
        self.focus = saved;
        Ok(kept)
    }

    /// Returns the nodes on `axis` from `node`, in proximity order.
    fn axis_nodes(&self, node: XPathNode, axis: Axis) -> Vec<XPathNode> {
        let doc = &*self.doc;
        let id = match node {
            XPathNode::Tree(id) => id,
            XPathNode::Attribute { owner, .. } => {
                return match axis {
                    Axis::Self_ | Axis::DescendantOrSelf => vec![node],
                    Axis::Parent => vec![XPathNode::Tree(owner)],
                    Axis::Ancestor => tree_nodes(doc.ancestors(owner)),
                    Axis::AncestorOrSelf => {
                        let mut nodes = vec![node];
                        nodes.extend(doc.ancestors(owner).map(XPathNode::Tree));
                        nodes
                    }
                    Axis::Following => {
                        let mut nodes = tree_nodes(doc.descendants(owner));
                        nodes.extend(self.following(owner));
                        nodes
                    }
                    Axis::Preceding => self.preceding(owner),
                    _ => Vec::new(),
                };
            }
        };

        match axis {
            Axis::Child => tree_nodes(doc.children(id)),
            Axis::Descendant => tree_nodes(doc.descendants(id)),
            Axis::DescendantOrSelf => {
                let mut nodes = vec![node];
                nodes.extend(doc.descendants(id).map(XPathNode::Tree));
                nodes
            }
            Axis::Parent => tree_nodes(doc.parent(id)),
            Axis::Ancestor => tree_nodes(doc.ancestors(id).skip(1)),
            Axis::AncestorOrSelf => tree_nodes(doc.ancestors(id)),
            Axis::FollowingSibling => {
                tree_nodes(std::iter::successors(doc.next_sibling(id), |&n| {
                    doc.next_sibling(n)
                }))
            }
            Axis::PrecedingSibling => {
                tree_nodes(std::iter::successors(doc.prev_sibling(id), |&n| {
                    doc.prev_sibling(n)
                }))
            }
            Axis::Following => self.following(id),
            Axis::Preceding => self.preceding(id),
            Axis::Attribute => (0..doc.attributes(id).len())
                .map(|index| XPathNode::Attribute { owner: id, index })
                .collect(),
            Axis::Namespace => Vec::new(),
            Axis::Self_ => vec![node],
        }
    }

    /// Nodes after `id` in document order, excluding its descendants.
    fn following(&self, id: NodeId) -> Vec<XPathNode> {
        let doc = &*self.doc;
        let mut nodes = Vec::new();
        for ancestor in doc.ancestors(id) {
            let mut sibling = doc.next_sibling(ancestor);
            while let Some(s) = sibling {
                nodes.push(XPathNode::Tree(s));
                nodes.extend(doc.descendants(s).map(XPathNode::Tree));
                sibling = doc.next_sibling(s);
            }
        }
        nodes
    }

    /// Nodes before `id` excluding its ancestors, nearest first.
    fn preceding(&self, id: NodeId) -> Vec<XPathNode> {
        let doc = &*self.doc;
        let mut nodes = Vec::new();
        for ancestor in doc.ancestors(id) {
            let mut sibling = doc.prev_sibling(ancestor);
            while let Some(s) = sibling {
                let inner: Vec<NodeId> = doc.descendants(s).collect();
                nodes.extend(inner.into_iter().rev().map(XPathNode::Tree));
                nodes.push(XPathNode::Tree(s));
                sibling = doc.prev_sibling(s);
            }
        }
        nodes
    }

    fn matches_test(&self, node: XPathNode, test: &NodeTest, uri: Option<&str>, axis: Axis) -> bool {
        match node {
            XPathNode::Attribute { owner, index } => {
                let Some(attr) = self.doc.attributes(owner).get(index) else {
                    return false;
                };
                match test {
                    NodeTest::Node => true,
                    _ if axis != Axis::Attribute => false,
                    NodeTest::Wildcard => true,
                    NodeTest::Name { local, .. } => {
                        attr.name == *local && attr.namespace.as_deref() == uri
                    }
                    NodeTest::PrefixWildcard(_) => attr.namespace.as_deref() == uri,
                    _ => false,
                }
            }
            XPathNode::Tree(id) => {
                let kind = &self.doc.node(id).kind;
                match test {
                    NodeTest::Node => true,
                    NodeTest::Text => kind.is_text_like(),
                    NodeTest::Comment => matches!(kind, NodeKind::Comment { .. }),
                    NodeTest::ProcessingInstruction(target) => match kind {
                        NodeKind::ProcessingInstruction { target: t, .. } => {
                            target.as_ref().map_or(true, |wanted| wanted == t)
                        }
                        _ => false,
                    },
                    // The principal node type of the attribute axis is
                    // attribute, so tree nodes never pass a name test there.
                    _ if axis == Axis::Attribute => false,
                    NodeTest::Wildcard => kind.is_element(),
                    NodeTest::Name { local, .. } => match kind {
                        NodeKind::Element {
                            name, namespace, ..
                        } => name == local && namespace.as_deref() == uri,
                        _ => false,
                    },
                    NodeTest::PrefixWildcard(_) => match kind {
                        NodeKind::Element { namespace, .. } => namespace.as_deref() == uri,
                        _ => false,
                    },
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Function dispatch
    // -----------------------------------------------------------------------

    fn eval_function(&mut self, name: &str, args: &[Expr]) -> Result<XPathValue, XPathError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }

        if let Some((prefix, local)) = name.split_once(':') {
            let uri = self.resolve_prefix(prefix)?;
            return exslt::call(self, &uri, local, values)
                .unwrap_or_else(|| Err(XPathError::eval("Unregistered function")));
        }

        if CORE_FUNCTIONS.contains(&name) {
            return self.call_core(name, &values);
        }

        match self.functions.get(name).cloned() {
            Some(function) => function(self, values),
            None => Err(XPathError::eval("Unregistered function")),
        }
    }

    /// Runs a function from the core library.
    #[allow(clippy::cast_precision_loss, clippy::too_many_lines)]
    fn call_core(&self, name: &str, args: &[XPathValue]) -> Result<XPathValue, XPathError> {
        let arity = |min: usize, max: usize| -> Result<(), XPathError> {
            if args.len() < min || args.len() > max {
                Err(XPathError::eval(format!(
                    "{name}() called with {} arguments",
                    args.len()
                )))
            } else {
                Ok(())
            }
        };
        Ok(match name {
            // Node-set functions
            "last" => {
                arity(0, 0)?;
                XPathValue::Number(self.focus.size as f64)
            }
            "position" => {
                arity(0, 0)?;
                XPathValue::Number(self.focus.position as f64)
            }
            "count" => {
                arity(1, 1)?;
                XPathValue::Number(node_set_arg(name, &args[0])?.len() as f64)
            }
            "id" => {
                arity(1, 1)?;
                XPathValue::NodeSet(self.ids(&args[0]))
            }
            "local-name" | "namespace-uri" | "name" => {
                arity(0, 1)?;
                let node = match args.first() {
                    Some(arg) => node_set_arg(name, arg)?.first().copied(),
                    None => Some(self.focus.node),
                };
                XPathValue::String(node.map(|n| self.name_part(n, name)).unwrap_or_default())
            }

            // String functions
            "string" => {
                arity(0, 1)?;
                XPathValue::String(self.string_arg(&args, 0))
            }
            "concat" => {
                if args.len() < 2 {
                    return Err(XPathError::eval("concat() needs at least 2 arguments"));
                }
                XPathValue::String(args.iter().map(|a| self.string(a)).collect())
            }
            "starts-with" | "contains" | "substring-before" | "substring-after" => {
                arity(2, 2)?;
                let haystack = self.string(&args[0]);
                let needle = self.string(&args[1]);
                match name {
                    "starts-with" => XPathValue::Boolean(haystack.starts_with(&needle)),
                    "contains" => XPathValue::Boolean(haystack.contains(&needle)),
                    "substring-before" => XPathValue::String(
                        haystack
                            .find(&needle)
                            .map(|i| haystack[..i].to_owned())
                            .unwrap_or_default(),
                    ),
                    _ => XPathValue::String(
                        haystack
                            .find(&needle)
                            .map(|i| haystack[i + needle.len()..].to_owned())
                            .unwrap_or_default(),
                    ),
                }
            }
            "substring" => {
                arity(2, 3)?;
                let s = self.string(&args[0]);
                let start = xpath_round(self.number(&args[1]));
                let end = args.get(2).map(|len| start + xpath_round(self.number(len)));
                XPathValue::String(
                    s.chars()
                        .enumerate()
                        .filter(|&(i, _)| {
                            let p = (i + 1) as f64;
                            p >= start && end.map_or(true, |e| p < e)
                        })
                        .map(|(_, c)| c)
                        .collect(),
                )
            }
            "string-length" => {
                arity(0, 1)?;
                XPathValue::Number(self.string_arg(&args, 0).chars().count() as f64)
            }
            "normalize-space" => {
                arity(0, 1)?;
                let s = self.string_arg(&args, 0);
                XPathValue::String(s.split_ascii_whitespace().collect::<Vec<_>>().join(" "))
            }
            "translate" => {
                arity(3, 3)?;
                let s = self.string(&args[0]);
                let from: Vec<char> = self.string(&args[1]).chars().collect();
                let to: Vec<char> = self.string(&args[2]).chars().collect();
                XPathValue::String(
                    s.chars()
                        .filter_map(|c| match from.iter().position(|&f| f == c) {
                            Some(i) => to.get(i).copied(),
                            None => Some(c),
                        })
                        .collect(),
                )
            }

            // Boolean functions
            "boolean" => {
                arity(1, 1)?;
                XPathValue::Boolean(args[0].to_boolean())
            }
            "not" => {
                arity(1, 1)?;
                XPathValue::Boolean(!args[0].to_boolean())
            }
            "true" | "false" => {
                arity(0, 0)?;
                XPathValue::Boolean(name == "true")
            }
            "lang" => {
                arity(1, 1)?;
                let wanted = self.string(&args[0]).to_ascii_lowercase();
                XPathValue::Boolean(self.lang_matches(&wanted))
            }

            // Number functions
            "number" => {
                arity(0, 1)?;
                match args.first() {
                    Some(arg) => XPathValue::Number(self.number(arg)),
                    None => XPathValue::Number(parse_xpath_number(
                        &self.string_value(self.focus.node),
                    )),
                }
            }
            "sum" => {
                arity(1, 1)?;
                let nodes = node_set_arg(name, &args[0])?;
                XPathValue::Number(
                    nodes
                        .iter()
                        .map(|&n| parse_xpath_number(&self.string_value(n)))
                        .sum(),
                )
            }
            "floor" | "ceiling" | "round" => {
                arity(1, 1)?;
                let n = self.number(&args[0]);
                XPathValue::Number(match name {
                    "floor" => n.floor(),
                    "ceiling" => n.ceil(),
                    _ => xpath_round(n),
                })
            }
            _ => return Err(XPathError::eval("Unregistered function")),
        })
    }

    /// String argument at `index`, or the context node's string-value.
    fn string_arg(&self, args: &[XPathValue], index: usize) -> String {
        match args.get(index) {
            Some(arg) => self.string(arg),
            None => self.string_value(self.focus.node),
        }
    }

    fn name_part(&self, node: XPathNode, which: &str) -> String {
        match node {
            XPathNode::Attribute { owner, index } => {
                let Some(attr) = self.doc.attributes(owner).get(index) else {
                    return String::new();
                };
                match which {
                    "local-name" => attr.name.clone(),
                    "namespace-uri" => attr.namespace.clone().unwrap_or_default(),
                    _ => attr.qualified_name(),
                }
            }
            XPathNode::Tree(id) => match which {
                "local-name" => self.doc.node_name(id).unwrap_or_default().to_owned(),
                "namespace-uri" => self.doc.node_namespace(id).unwrap_or_default().to_owned(),
                _ => self.doc.qualified_name(id).unwrap_or_default(),
            },
        }
    }

    fn ids(&self, arg: &XPathValue) -> Vec<XPathNode> {
        let text = match arg {
            XPathValue::NodeSet(nodes) => nodes
                .iter()
                .map(|&n| self.string_value(n))
                .collect::<Vec<_>>()
                .join(" "),
            other => self.string(other),
        };
        let mut found: Vec<XPathNode> = text
            .split_ascii_whitespace()
            .filter_map(|token| self.doc.element_by_id(token))
            .map(XPathNode::Tree)
            .collect();
        sort_document_order(&mut found);
        found
    }

    fn lang_matches(&self, wanted: &str) -> bool {
        let anchor = self.focus.node.anchor();
        let declared = self.doc.ancestors(anchor).find_map(|id| {
            self.doc
                .attributes(id)
                .iter()
                .find(|a| a.name == "lang" && a.namespace.as_deref() == Some(XML_NAMESPACE))
                .map(|a| a.value.to_ascii_lowercase())
        });
        declared.is_some_and(|lang| {
            lang == wanted
                || lang
                    .strip_prefix(wanted)
                    .is_some_and(|rest| rest.starts_with('-'))
        })
    }

    // -----------------------------------------------------------------------
    // Comparison helpers
    // -----------------------------------------------------------------------

    /// Compares two values for (in)equality per `XPath` 1.0 section 3.4.
    #[allow(clippy::float_cmp)]
    fn compare_equality(&self, op: BinaryOp, lhs: &XPathValue, rhs: &XPathValue) -> bool {
        let eq = op == BinaryOp::Eq;
        let strings = |a: &str, b: &str| if eq { a == b } else { a != b };
        let numbers = |a: f64, b: f64| if eq { a == b } else { a != b };
        match (lhs, rhs) {
            (XPathValue::NodeSet(lns), XPathValue::NodeSet(rns)) => {
                let right: Vec<String> = rns.iter().map(|&n| self.string_value(n)).collect();
                lns.iter().any(|&ln| {
                    let lsv = self.string_value(ln);
                    right.iter().any(|rsv| strings(&lsv, rsv))
                })
            }
            (XPathValue::NodeSet(ns), XPathValue::Boolean(b))
            | (XPathValue::Boolean(b), XPathValue::NodeSet(ns)) => (!ns.is_empty() == *b) == eq,
            (XPathValue::NodeSet(ns), XPathValue::Number(n))
            | (XPathValue::Number(n), XPathValue::NodeSet(ns)) => ns
                .iter()
                .any(|&node| numbers(parse_xpath_number(&self.string_value(node)), *n)),
            (XPathValue::NodeSet(ns), XPathValue::String(s))
            | (XPathValue::String(s), XPathValue::NodeSet(ns)) => ns
                .iter()
                .any(|&node| strings(&self.string_value(node), s)),
            (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => {
                (lhs.to_boolean() == rhs.to_boolean()) == eq
            }
            (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => {
                numbers(self.number(lhs), self.number(rhs))
            }
            _ => strings(&self.string(lhs), &self.string(rhs)),
        }
    }

    /// Compares two values relationally per `XPath` 1.0 section 3.4.
    fn compare_relational(&self, op: BinaryOp, lhs: &XPathValue, rhs: &XPathValue) -> bool {
        let cmp = |a: f64, b: f64| -> bool {
            match op {
                BinaryOp::Lt => a < b,
                BinaryOp::Lte => a <= b,
                BinaryOp::Gt => a > b,
                _ => a >= b,
            }
        };
        let numbers_of = |value: &XPathValue| -> Vec<f64> {
            match value {
                XPathValue::NodeSet(ns) => ns
                    .iter()
                    .map(|&n| parse_xpath_number(&self.string_value(n)))
                    .collect(),
                other => vec![self.number(other)],
            }
        };
        match (lhs, rhs) {
            (XPathValue::NodeSet(_), XPathValue::Boolean(_))
            | (XPathValue::Boolean(_), XPathValue::NodeSet(_)) => cmp(
                f64::from(u8::from(lhs.to_boolean())),
                f64::from(u8::from(rhs.to_boolean())),
            ),
            _ => {
                let left = numbers_of(lhs);
                let right = numbers_of(rhs);
                left.iter().any(|&a| right.iter().any(|&b| cmp(a, b)))
            }
        }
    }
}

/// Names handled by the core function library.
const CORE_FUNCTIONS: &[&str] = &[
    "last",
    "position",
    "count",
    "id",
    "local-name",
    "namespace-uri",
    "name",
    "string",
    "concat",
    "starts-with",
    "contains",
    "substring-before",
    "substring-after",
    "substring",
    "string-length",
    "normalize-space",
    "translate",
    "boolean",
    "not",
    "true",
    "false",
    "lang",
    "number",
    "sum",
    "floor",
    "ceiling",
    "round",
];

fn tree_nodes(ids: impl IntoIterator<Item = NodeId>) -> Vec<XPathNode> {
    ids.into_iter().map(XPathNode::Tree).collect()
}

fn node_set_arg<'v>(name: &str, value: &'v XPathValue) -> Result<&'v [XPathNode], XPathError> {
    value.as_node_set().ok_or_else(|| {
        XPathError::eval(format!(
            "{name}() expects a node-set, found {}",
            value.type_name()
        ))
    })
}

/// Rounds half toward positive infinity, keeping NaN and infinities.
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        return n;
    }
    (n + 0.5).floor()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::xpath::parser::parse;

    fn eval_in(doc: &mut Document, expr: &str) -> Result<XPathValue, XPathError> {
        let root = doc.root();
        let mut ctx = XPathContext::new(doc, XPathNode::Tree(root));
        ctx.set_namespace("re", exslt::REGEXP_NAMESPACE);
        ctx.set_namespace("set", exslt::SETS_NAMESPACE);
        ctx.evaluate(&parse(expr).unwrap())
    }

    fn strings(xml: &str, expr: &str) -> Vec<String> {
        let mut doc = crate::parser::parse_xml(xml);
        let value = eval_in(&mut doc, expr).unwrap();
        let root = doc.root();
        let ctx = XPathContext::new(&mut doc, XPathNode::Tree(root));
        match &value {
            XPathValue::NodeSet(nodes) => nodes.iter().map(|&n| ctx.string_value(n)).collect(),
            other => vec![ctx.string(other)],
        }
    }

    fn scalar(expr: &str) -> String {
        strings("<r/>", expr).remove(0)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(scalar("1 + 2 * 3"), "7");
        assert_eq!(scalar("7 mod 3"), "1");
        assert_eq!(scalar("-7 mod 3"), "-1");
        assert_eq!(scalar("1 div 0"), "Infinity");
        assert_eq!(scalar("0 div 0"), "NaN");
        assert_eq!(scalar("-(2 - 5)"), "3");
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(scalar("concat('a', 'b', 1)"), "ab1");
        assert_eq!(scalar("substring('12345', 1.5, 2.6)"), "234");
        assert_eq!(scalar("substring('12345', 0, 3)"), "12");
        assert_eq!(scalar("substring-before('1999/04/01', '/')"), "1999");
        assert_eq!(scalar("substring-after('1999/04/01', '/')"), "04/01");
        assert_eq!(scalar("normalize-space('  a \n b  ')"), "a b");
        assert_eq!(scalar("translate('bar', 'abc', 'ABC')"), "BAr");
        assert_eq!(scalar("translate('--aaa--', 'abc-', 'ABC')"), "AAA");
        assert_eq!(scalar("string-length('héllo')"), "5");
    }

    #[test]
    fn test_number_functions() {
        assert_eq!(scalar("round(2.5)"), "3");
        assert_eq!(scalar("round(-2.5)"), "-2");
        assert_eq!(scalar("floor(-1.5)"), "-2");
        assert_eq!(scalar("ceiling(1.1)"), "2");
        assert_eq!(scalar("number('  12 ')"), "12");
        assert_eq!(scalar("number('x')"), "NaN");
        assert_eq!(scalar("boolean('')"), "false");
    }

    #[test]
    fn test_node_set_comparisons() {
        let xml = "<r><a>1</a><a>2</a><b>2</b></r>";
        assert_eq!(strings(xml, "//a = 2"), vec!["true"]);
        assert_eq!(strings(xml, "//a != 2"), vec!["true"]);
        assert_eq!(strings(xml, "//a = //b"), vec!["true"]);
        assert_eq!(strings(xml, "//a > 1"), vec!["true"]);
        assert_eq!(strings(xml, "//a > 2"), vec!["false"]);
        assert_eq!(strings(xml, "//missing = ''"), vec!["false"]);
        assert_eq!(strings(xml, "//missing != ''"), vec!["false"]);
    }

    #[test]
    fn test_paths_and_predicates() {
        let xml = "<r><a>1</a><a>2</a><a>3</a></r>";
        assert_eq!(strings(xml, "//a[2]"), vec!["2"]);
        assert_eq!(strings(xml, "//a[last()]"), vec!["3"]);
        assert_eq!(strings(xml, "(//a)[position() > 1]"), vec!["2", "3"]);
        assert_eq!(strings(xml, "count(/r/a)"), vec!["3"]);
        assert_eq!(strings(xml, "//a[. = '2']/following-sibling::a"), vec!["3"]);
        assert_eq!(strings(xml, "//a[3]/preceding-sibling::a[1]"), vec!["2"]);
        assert_eq!(strings(xml, "//a[3]/preceding::a"), vec!["1", "2"]);
    }

    #[test]
    fn test_attribute_axis() {
        let xml = r#"<r><a href="x" id="1"/><a href="y"/></r>"#;
        assert_eq!(strings(xml, "//a/@href"), vec!["x", "y"]);
        assert_eq!(strings(xml, "//@*"), vec!["x", "1", "y"]);
        assert_eq!(strings(xml, "//a[@id]/@href"), vec!["x"]);
        assert_eq!(strings(xml, "name(//a/@*[2])"), vec!["id"]);
        assert_eq!(strings(xml, "local-name(//@href/..)"), vec!["a"]);
    }

    #[test]
    fn test_text_nodes_and_union() {
        let xml = "<r><a>x</a><!--c--><b>y</b></r>";
        assert_eq!(strings(xml, "//text()"), vec!["x", "y"]);
        assert_eq!(strings(xml, "//b | //a"), vec!["x", "y"]);
        assert_eq!(strings(xml, "//comment()"), vec!["c"]);
    }

    #[test]
    fn test_namespaced_name_tests() {
        let xml = r#"<r xmlns:p="urn:p"><p:a>1</p:a><a>2</a></r>"#;
        let mut doc = crate::parser::parse_xml(xml);
        let root = doc.root();
        let mut ctx = XPathContext::new(&mut doc, XPathNode::Tree(root));
        ctx.set_namespace("q", "urn:p");
        let value = ctx.evaluate(&parse("//q:a").unwrap()).unwrap();
        assert_eq!(ctx.string(&value), "1");
        let value = ctx.evaluate(&parse("//a").unwrap()).unwrap();
        assert_eq!(ctx.string(&value), "2");
        assert!(ctx.evaluate(&parse("//z:a").unwrap()).is_err());
    }

    #[test]
    fn test_variables() {
        let mut doc = crate::parser::parse_xml("<r><a>1</a><a>2</a></r>");
        let root = doc.root();
        let mut ctx = XPathContext::new(&mut doc, XPathNode::Tree(root));
        ctx.set_variable("n", XPathValue::Number(2.0));
        let value = ctx.evaluate(&parse("//a[$n]").unwrap()).unwrap();
        assert_eq!(ctx.string(&value), "2");
        let err = ctx.evaluate(&parse("$missing").unwrap()).unwrap_err();
        assert!(err.message.contains("Undefined variable"));
    }

    #[test]
    fn test_unknown_function() {
        let mut doc = crate::parser::parse_xml("<r/>");
        let err = eval_in(&mut doc, "no-such-function()").unwrap_err();
        assert_eq!(err.message, "Unregistered function");
        assert!(!err.is_syntax_error());
    }

    #[test]
    fn test_core_argument_errors() {
        let mut doc = crate::parser::parse_xml("<r/>");
        assert!(eval_in(&mut doc, "count('a')").is_err());
        assert!(eval_in(&mut doc, "concat('a')").is_err());
        assert!(eval_in(&mut doc, "true(1)").is_err());
    }

    #[test]
    fn test_lang() {
        let xml = r#"<r xml:lang="en-US"><a/></r>"#;
        assert_eq!(strings(xml, "count(//a[lang('en')])"), vec!["1"]);
        assert_eq!(strings(xml, "count(//a[lang('fr')])"), vec!["0"]);
    }

    #[test]
    fn test_id_function() {
        let xml = r#"<r><a xml:id="one">1</a><a xml:id="two">2</a></r>"#;
        assert_eq!(strings(xml, "id('two one')"), vec!["1", "2"]);
    }
}
