//! `XPath` 1.0 expression tokenizer.
//!
//! Names are classified while scanning, using the token that precedes them
//! and the next significant character (`XPath` 1.0 section 3.7):
//!
//! - after a token that can end an operand, `*` is multiplication and
//!   `and`/`or`/`mod`/`div` are operators;
//! - a name followed by `(` is a function name or node type test;
//! - a name followed by `::` is an axis name;
//! - anything else is a name test.

use super::types::XPathError;
use std::fmt;

/// Names that form node type tests when followed by `(`.
const NODE_TYPE_NAMES: &[&str] = &["comment", "text", "processing-instruction", "node"];

/// A token produced by the [`Lexer`].
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `@`
    At,
    /// `,`
    Comma,
    /// `::`
    ColonColon,
    /// `/`
    Slash,
    /// `//`
    DoubleSlash,
    /// `|`
    Pipe,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*` used as multiplication.
    Star,
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqual,
    /// `and`
    And,
    /// `or`
    Or,
    /// `mod`
    Mod,
    /// `div`
    Div,
    /// A numeric literal.
    Number(f64),
    /// A string literal, without quotes.
    Literal(String),
    /// A name test: `foo`, `svg:rect`, `*` or `svg:*`.
    Name(String),
    /// `$name`, stored without the `$`.
    VariableReference(String),
    /// A name followed by `(` that is not a node type.
    FunctionName(String),
    /// `node`, `text`, `comment` or `processing-instruction` before `(`.
    NodeType(String),
    /// A name followed by `::`.
    AxisName(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::Dot => ".",
            Self::DotDot => "..",
            Self::At => "@",
            Self::Comma => ",",
            Self::ColonColon => "::",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Pipe => "|",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
            Self::And => "and",
            Self::Or => "or",
            Self::Mod => "mod",
            Self::Div => "div",
            Self::Number(n) => return write!(f, "{n}"),
            Self::Literal(s) => return write!(f, "\"{s}\""),
            Self::VariableReference(s) => return write!(f, "${s}"),
            Self::Name(s) | Self::FunctionName(s) | Self::NodeType(s) | Self::AxisName(s) => s,
        };
        f.write_str(symbol)
    }
}

impl Token {
    /// Returns `true` if this token can end an operand, which turns a
    /// following `*` or keyword name into an operator.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Self::RightParen
                | Self::RightBracket
                | Self::Dot
                | Self::DotDot
                | Self::Number(_)
                | Self::Literal(_)
                | Self::Name(_)
                | Self::VariableReference(_)
        )
    }
}

/// `XPath` 1.0 tokenizer over a borrowed expression string.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer for the given expression.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenizes the whole expression.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError`] on an unterminated literal or a character that
    /// cannot start any token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, XPathError> {
        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else {
                break;
            };
            let token = self.next_token(ch)?;
            self.tokens.push(token);
        }
        Ok(self.tokens)
    }

    fn after_operand(&self) -> bool {
        self.tokens.last().is_some_and(Token::ends_operand)
    }

    fn next_token(&mut self, ch: u8) -> Result<Token, XPathError> {
        let start = self.pos;
        let simple = match ch {
            b'(' => Some(Token::LeftParen),
            b')' => Some(Token::RightParen),
            b'[' => Some(Token::LeftBracket),
            b']' => Some(Token::RightBracket),
            b'@' => Some(Token::At),
            b',' => Some(Token::Comma),
            b'|' => Some(Token::Pipe),
            b'+' => Some(Token::Plus),
            b'-' => Some(Token::Minus),
            b'=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = simple {
            self.pos += 1;
            return Ok(token);
        }

        match ch {
            b'*' => {
                self.pos += 1;
                Ok(if self.after_operand() {
                    Token::Star
                } else {
                    Token::Name("*".to_string())
                })
            }
            b'/' => Ok(self.either(b'/', Token::DoubleSlash, Token::Slash)),
            b'<' => Ok(self.either(b'=', Token::LessThanEqual, Token::LessThan)),
            b'>' => Ok(self.either(b'=', Token::GreaterThanEqual, Token::GreaterThan)),
            b'!' if self.peek_at(1) == Some(b'=') => {
                self.pos += 2;
                Ok(Token::NotEqual)
            }
            b':' if self.peek_at(1) == Some(b':') => {
                self.pos += 2;
                Ok(Token::ColonColon)
            }
            b'.' => self.read_dot(),
            b'"' | b'\'' => self.read_literal(ch),
            b'$' => self.read_variable(),
            b'0'..=b'9' => self.read_number(),
            _ if is_name_start(ch) => Ok(self.read_name()),
            _ => {
                let shown = self.input[start..].chars().next().unwrap_or('?');
                Err(XPathError::new(
                    format!("unexpected character '{shown}'"),
                    start,
                ))
            }
        }
    }

    /// Consumes one byte, then a second one if it equals `second`.
    fn either(&mut self, second: u8, double: Token, single: Token) -> Token {
        self.pos += 1;
        if self.peek() == Some(second) {
            self.pos += 1;
            double
        } else {
            single
        }
    }

    fn read_dot(&mut self) -> Result<Token, XPathError> {
        match self.peek_at(1) {
            Some(b'.') => {
                self.pos += 2;
                Ok(Token::DotDot)
            }
            Some(b'0'..=b'9') => self.read_number(),
            _ => {
                self.pos += 1;
                Ok(Token::Dot)
            }
        }
    }

    fn read_number(&mut self) -> Result<Token, XPathError> {
        let start = self.pos;
        self.advance_while(|b| b.is_ascii_digit());
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.advance_while(|b| b.is_ascii_digit());
        }
        let text = &self.input[start..self.pos];
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| XPathError::new(format!("invalid number literal: {text}"), start))
    }

    fn read_literal(&mut self, quote: u8) -> Result<Token, XPathError> {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        self.advance_while(|b| b != quote);
        if self.pos >= self.bytes.len() {
            return Err(XPathError::new("unterminated string literal", start));
        }
        let content = self.input[content_start..self.pos].to_string();
        self.pos += 1;
        Ok(Token::Literal(content))
    }

    fn read_variable(&mut self) -> Result<Token, XPathError> {
        let start = self.pos;
        self.pos += 1;
        if !self.peek().is_some_and(is_name_start) {
            return Err(XPathError::new("expected name after '$'", start));
        }
        let name = self.read_qname();
        Ok(Token::VariableReference(name.to_string()))
    }

    /// Reads an `NCName` optionally followed by `:NCName` or `:*`.
    fn read_qname(&mut self) -> &'a str {
        let input = self.input;
        let start = self.pos;
        self.advance_while(is_name_char);
        if self.peek() == Some(b':') {
            match self.peek_at(1) {
                Some(b'*') => self.pos += 2,
                Some(b) if b != b':' && is_name_start(b) => {
                    self.pos += 1;
                    self.advance_while(is_name_char);
                }
                _ => {}
            }
        }
        &input[start..self.pos]
    }

    fn read_name(&mut self) -> Token {
        let after_operand = self.after_operand();
        let name = self.read_qname();

        if after_operand {
            match name {
                "and" => return Token::And,
                "or" => return Token::Or,
                "mod" => return Token::Mod,
                "div" => return Token::Div,
                _ => {}
            }
        }

        self.skip_whitespace();
        match (self.peek(), self.peek_at(1)) {
            (Some(b'('), _) if NODE_TYPE_NAMES.contains(&name) => {
                Token::NodeType(name.to_string())
            }
            (Some(b'('), _) => Token::FunctionName(name.to_string()),
            (Some(b':'), Some(b':')) => Token::AxisName(name.to_string()),
            _ => Token::Name(name.to_string()),
        }
    }

    // --- Utility methods ---

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        self.advance_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
    }
}

/// Returns `true` if the byte can start a name. Bytes of multi-byte UTF-8
/// sequences are accepted so non-ASCII names survive intact.
fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}
