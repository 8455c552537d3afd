//! Recursive descent parser for `XPath` 1.0.
//!
//! Binary operators are parsed by precedence climbing over a fixed level
//! table, lowest first:
//!
//! 1. `or`
//! 2. `and`
//! 3. `=`, `!=`
//! 4. `<`, `<=`, `>`, `>=`
//! 5. `+`, `-`
//! 6. `*`, `div`, `mod`
//!
//! Below those sit unary minus, union (`|`) and path expressions.

use super::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use super::lexer::{Lexer, Token};
use super::types::XPathError;

/// Number of binary precedence levels.
const BINARY_LEVELS: usize = 6;

/// Parses an expression string into an AST.
///
/// # Errors
///
/// Returns [`XPathError`] if the input is not a valid `XPath` 1.0
/// expression. The position is the index of the offending token.
///
/// # Examples
///
/// ```
/// use seloxide::xpath::parser::parse;
///
/// assert!(parse("//p[has-class('intro')]/text()").is_ok());
/// assert!(parse("//div[@id=").is_err());
/// ```
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    let tokens = Lexer::new(input).tokenize()?;
    if tokens.is_empty() {
        return Err(XPathError::new("empty XPath expression", 0));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_binary(0)?;
    if let Some(token) = parser.peek() {
        return Err(parser.error(&format!("unexpected token '{token}' after expression")));
    }
    Ok(expr)
}

/// Maps a token to the binary operator it denotes at a precedence level.
fn operator_at(level: usize, token: &Token) -> Option<BinaryOp> {
    Some(match (level, token) {
        (0, Token::Or) => BinaryOp::Or,
        (1, Token::And) => BinaryOp::And,
        (2, Token::Equal) => BinaryOp::Eq,
        (2, Token::NotEqual) => BinaryOp::Neq,
        (3, Token::LessThan) => BinaryOp::Lt,
        (3, Token::LessThanEqual) => BinaryOp::Lte,
        (3, Token::GreaterThan) => BinaryOp::Gt,
        (3, Token::GreaterThanEqual) => BinaryOp::Gte,
        (4, Token::Plus) => BinaryOp::Add,
        (4, Token::Minus) => BinaryOp::Sub,
        (5, Token::Star) => BinaryOp::Mul,
        (5, Token::Div) => BinaryOp::Div,
        (5, Token::Mod) => BinaryOp::Mod,
        _ => return None,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    // -----------------------------------------------------------------------
    // Token access helpers
    // -----------------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), XPathError> {
        if self.eat(token) {
            return Ok(());
        }
        let found = self
            .peek()
            .map_or_else(|| "end of expression".to_string(), |t| format!("'{t}'"));
        Err(self.error(&format!("expected '{token}', found {found}")))
    }

    fn error(&self, message: &str) -> XPathError {
        XPathError::new(message, self.pos)
    }

    // -----------------------------------------------------------------------
    // Grammar productions
    // -----------------------------------------------------------------------

    fn parse_binary(&mut self, level: usize) -> Result<Expr, XPathError> {
        if level == BINARY_LEVELS {
            return self.parse_unary();
        }
        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = self.peek().and_then(|t| operator_at(level, t)) {
            self.pos += 1;
            let right = self.parse_binary(level + 1)?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `UnaryExpr ::= UnionExpr | '-' UnaryExpr`
    fn parse_unary(&mut self) -> Result<Expr, XPathError> {
        if self.eat(&Token::Minus) {
            let inner = self.parse_unary()?;
            return Ok(Expr::UnaryNeg(Box::new(inner)));
        }
        self.parse_union()
    }

    /// `UnionExpr ::= PathExpr ('|' PathExpr)*`
    fn parse_union(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_path()?;
        while self.eat(&Token::Pipe) {
            let right = self.parse_path()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `PathExpr ::= LocationPath | FilterExpr (('/' | '//') RelativeLocationPath)?`
    fn parse_path(&mut self) -> Result<Expr, XPathError> {
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                let mut steps = Vec::new();
                if self.at_step_start() {
                    self.parse_relative_into(&mut steps)?;
                }
                Ok(Expr::Path {
                    absolute: true,
                    steps,
                })
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                let mut steps = vec![Step::new(Axis::DescendantOrSelf, NodeTest::Node)];
                self.parse_relative_into(&mut steps)?;
                Ok(Expr::Path {
                    absolute: true,
                    steps,
                })
            }
            Some(_) if self.at_step_start() => {
                let mut steps = Vec::new();
                self.parse_relative_into(&mut steps)?;
                Ok(Expr::Path {
                    absolute: false,
                    steps,
                })
            }
            Some(
                Token::VariableReference(_)
                | Token::Literal(_)
                | Token::Number(_)
                | Token::LeftParen
                | Token::FunctionName(_),
            ) => {
                let filter = self.parse_filter()?;
                let mut steps = Vec::new();
                if self.eat(&Token::DoubleSlash) {
                    steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                } else if !self.eat(&Token::Slash) {
                    return Ok(filter);
                }
                self.parse_relative_into(&mut steps)?;
                Ok(Expr::FilterPath {
                    filter: Box::new(filter),
                    steps,
                })
            }
            Some(token) => Err(self.error(&format!("expected expression, found '{token}'"))),
            None => Err(self.error("expected expression, found end of expression")),
        }
    }

    /// `FilterExpr ::= PrimaryExpr Predicate*`
    fn parse_filter(&mut self) -> Result<Expr, XPathError> {
        let expr = self.parse_primary()?;
        let predicates = self.parse_predicates()?;
        if predicates.is_empty() {
            Ok(expr)
        } else {
            Ok(Expr::Filter {
                expr: Box::new(expr),
                predicates,
            })
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, XPathError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("expected primary expression"));
        };
        self.pos += 1;
        match token {
            Token::VariableReference(name) => Ok(Expr::Variable(name)),
            Token::Literal(value) => Ok(Expr::String(value)),
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::LeftParen => {
                let expr = self.parse_binary(0)?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }
            Token::FunctionName(name) => {
                self.expect(&Token::LeftParen)?;
                let mut args = Vec::new();
                if !self.eat(&Token::RightParen) {
                    loop {
                        args.push(self.parse_binary(0)?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    self.expect(&Token::RightParen)?;
                }
                Ok(Expr::FunctionCall { name, args })
            }
            other => {
                self.pos -= 1;
                Err(self.error(&format!("expected primary expression, found '{other}'")))
            }
        }
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Dot
                    | Token::DotDot
                    | Token::At
                    | Token::Name(_)
                    | Token::NodeType(_)
                    | Token::AxisName(_)
            )
        )
    }

    /// `RelativeLocationPath ::= Step (('/' | '//') Step)*`
    fn parse_relative_into(&mut self, steps: &mut Vec<Step>) -> Result<(), XPathError> {
        steps.push(self.parse_step()?);
        loop {
            if self.eat(&Token::DoubleSlash) {
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
            } else if !self.eat(&Token::Slash) {
                return Ok(());
            }
            steps.push(self.parse_step()?);
        }
    }

    /// `Step ::= AxisSpecifier NodeTest Predicate* | '.' | '..'`
    fn parse_step(&mut self) -> Result<Step, XPathError> {
        if self.eat(&Token::Dot) {
            return Ok(Step::new(Axis::Self_, NodeTest::Node));
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step::new(Axis::Parent, NodeTest::Node));
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let Some(Token::AxisName(name)) = self.peek().cloned() {
            let axis = Axis::parse(&name)
                .ok_or_else(|| self.error(&format!("unknown axis '{name}'")))?;
            self.pos += 1;
            self.expect(&Token::ColonColon)?;
            axis
        } else {
            Axis::Child
        };

        let node_test = self.parse_node_test()?;
        let predicates = self.parse_predicates()?;
        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        match self.peek().cloned() {
            Some(Token::Name(name)) => {
                self.pos += 1;
                Ok(NodeTest::from_name(&name))
            }
            Some(Token::NodeType(kind)) => {
                self.pos += 1;
                self.expect(&Token::LeftParen)?;
                let test = match kind.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => match self.peek().cloned() {
                        Some(Token::Literal(target)) => {
                            self.pos += 1;
                            NodeTest::ProcessingInstruction(Some(target))
                        }
                        _ => NodeTest::ProcessingInstruction(None),
                    },
                };
                self.expect(&Token::RightParen)?;
                Ok(test)
            }
            Some(token) => Err(self.error(&format!("expected node test, found '{token}'"))),
            None => Err(self.error("expected node test, found end of expression")),
        }
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LeftBracket) {
            predicates.push(self.parse_binary(0)?);
            self.expect(&Token::RightBracket)?;
        }
        Ok(predicates)
    }
}
