//! Abstract syntax tree for `XPath` 1.0 expressions.
//!
//! The tree follows the grammar in <https://www.w3.org/TR/xpath-10/>:
//! [`Expr`] covers every expression form, location paths are lists of
//! [`Step`]s, and each step pairs an [`Axis`] with a [`NodeTest`].

/// An `XPath` 1.0 expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal.
    Number(f64),
    /// A string literal.
    String(String),
    /// `$name`, without the `$`.
    Variable(String),
    /// A binary operation.
    BinaryOp {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Unary negation.
    UnaryNeg(Box<Expr>),
    /// A function call. `name` keeps its prefix (`re:test`).
    FunctionCall {
        /// The qualified function name.
        name: String,
        /// Argument expressions.
        args: Vec<Expr>,
    },
    /// A location path. Absolute paths start at the root of the context
    /// node's tree; an absolute path without steps is `/` itself.
    Path {
        /// Whether the path started with `/` or `//`.
        absolute: bool,
        /// Steps, evaluated left to right.
        steps: Vec<Step>,
    },
    /// A primary expression filtered by predicates, e.g. `(//a)[1]`.
    Filter {
        /// The filtered expression.
        expr: Box<Expr>,
        /// Predicates applied in document order.
        predicates: Vec<Expr>,
    },
    /// A filter expression continued by a relative path, e.g.
    /// `id('x')//b` or `re:match(., 'a')/text()`.
    FilterPath {
        /// The expression producing the starting node-set.
        filter: Box<Expr>,
        /// Steps applied to each node of that set.
        steps: Vec<Step>,
    },
    /// `a | b`
    Union(Box<Expr>, Box<Expr>),
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `or`
    Or,
    /// `and`
    And,
    /// `=`
    Eq,
    /// `!=`
    Neq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `div`
    Div,
    /// `mod`
    Mod,
}

impl BinaryOp {
    /// Returns the operator as written in an expression.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "div",
            Self::Mod => "mod",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single location step: `axis::node-test[predicate]*`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// The axis to walk.
    pub axis: Axis,
    /// The test every candidate must pass.
    pub node_test: NodeTest,
    /// Predicates, applied in proximity order.
    pub predicates: Vec<Expr>,
}

impl Step {
    /// Creates a step without predicates.
    #[must_use]
    pub fn new(axis: Axis, node_test: NodeTest) -> Self {
        Self {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }
}

/// An `XPath` axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// `child`
    Child,
    /// `descendant`
    Descendant,
    /// `parent`
    Parent,
    /// `ancestor`
    Ancestor,
    /// `following-sibling`
    FollowingSibling,
    /// `preceding-sibling`
    PrecedingSibling,
    /// `following`
    Following,
    /// `preceding`
    Preceding,
    /// `attribute`
    Attribute,
    /// `namespace`. Namespace nodes are not materialized, so this axis
    /// always selects nothing.
    Namespace,
    /// `self`
    Self_,
    /// `descendant-or-self`
    DescendantOrSelf,
    /// `ancestor-or-self`
    AncestorOrSelf,
}

impl Axis {
    /// Looks up an axis by its name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            "following" => Self::Following,
            "preceding" => Self::Preceding,
            "attribute" => Self::Attribute,
            "namespace" => Self::Namespace,
            "self" => Self::Self_,
            "descendant-or-self" => Self::DescendantOrSelf,
            "ancestor-or-self" => Self::AncestorOrSelf,
            _ => return None,
        })
    }

    /// Returns `true` for axes whose proximity order is reverse document
    /// order.
    #[must_use]
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Self::Ancestor | Self::AncestorOrSelf | Self::Preceding | Self::PrecedingSibling
        )
    }
}

/// A node test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// A (possibly prefixed) name.
    Name {
        /// Prefix to resolve against the namespace table.
        prefix: Option<String>,
        /// Local part of the name.
        local: String,
    },
    /// `*`
    Wildcard,
    /// `prefix:*`
    PrefixWildcard(String),
    /// `node()`
    Node,
    /// `text()`
    Text,
    /// `comment()`
    Comment,
    /// `processing-instruction()` with an optional target literal.
    ProcessingInstruction(Option<String>),
}

impl NodeTest {
    /// Builds a name test from a lexer name such as `svg:rect` or `*`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name == "*" {
            return Self::Wildcard;
        }
        if let Some(prefix) = name.strip_suffix(":*") {
            return Self::PrefixWildcard(prefix.to_string());
        }
        match name.split_once(':') {
            Some((prefix, local)) => Self::Name {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => Self::Name {
                prefix: None,
                local: name.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_parse() {
        assert_eq!(Axis::parse("descendant-or-self"), Some(Axis::DescendantOrSelf));
        assert_eq!(Axis::parse("following-sibling"), Some(Axis::FollowingSibling));
        assert_eq!(Axis::parse("children"), None);
    }

    #[test]
    fn test_reverse_axes() {
        assert!(Axis::Ancestor.is_reverse());
        assert!(Axis::PrecedingSibling.is_reverse());
        assert!(!Axis::Following.is_reverse());
        assert!(!Axis::Child.is_reverse());
    }

    #[test]
    fn test_node_test_from_name() {
        assert_eq!(NodeTest::from_name("*"), NodeTest::Wildcard);
        assert_eq!(
            NodeTest::from_name("svg:*"),
            NodeTest::PrefixWildcard("svg".to_string())
        );
        assert_eq!(
            NodeTest::from_name("p:SecondTestTag"),
            NodeTest::Name {
                prefix: Some("p".to_string()),
                local: "SecondTestTag".to_string(),
            }
        );
    }

    #[test]
    fn test_binary_op_display() {
        assert_eq!(BinaryOp::Div.to_string(), "div");
        assert_eq!(BinaryOp::Neq.to_string(), "!=");
    }
}
