//! CSS selector tokenizer and parser.
//!
//! Produces a [`Selector`] tree per comma-separated group. The grammar is
//! the Selectors Level 3 subset understood by the translator, plus
//! `:not()`, `:is()`/`:matches()`, `:where()` and `:has()`.
//!
//! Pseudo-elements are resolved to a [`PseudoElement`] here, so the
//! translator never dispatches on names.

use std::fmt;

use super::CssError;

/// The category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Hash,
    String,
    Number,
    Delim,
    Whitespace,
    Eof,
}

impl TokenKind {
    fn label(self) -> &'static str {
        match self {
            Self::Ident => "IDENT",
            Self::Hash => "HASH",
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Delim => "DELIM",
            Self::Whitespace => "S",
            Self::Eof => "EOF",
        }
    }
}

/// A selector token with its unescaped value and byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub pos: usize,
}

impl Token {
    fn new(kind: TokenKind, value: impl Into<String>, pos: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            pos,
        }
    }

    fn is_delim(&self, chars: &str) -> bool {
        self.kind == TokenKind::Delim && self.value.len() == 1 && chars.contains(self.value.as_str())
    }

    fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "<EOF at {}>", self.pos),
            kind => write!(f, "<{} '{}' at {}>", kind.label(), self.value, self.pos),
        }
    }
}

/// A CSS combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// ` `
    Descendant,
    /// `>`
    Child,
    /// `+`
    DirectAdjacent,
    /// `~`
    IndirectAdjacent,
}

impl Combinator {
    fn from_delim(delim: &str) -> Option<Self> {
        match delim {
            " " => Some(Self::Descendant),
            ">" => Some(Self::Child),
            "+" => Some(Self::DirectAdjacent),
            "~" => Some(Self::IndirectAdjacent),
            _ => None,
        }
    }
}

/// Attribute selector operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttribOp {
    Exists,
    /// `=`
    Equals,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
    /// `^=`
    PrefixMatch,
    /// `$=`
    SuffixMatch,
    /// `*=`
    SubstringMatch,
    /// `!=`
    Different,
}

/// A parsed selector tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree {
    /// A type selector; `None` parts mean `*`.
    Element {
        namespace: Option<String>,
        element: Option<String>,
    },
    Class {
        selector: Box<Tree>,
        class_name: String,
    },
    Hash {
        selector: Box<Tree>,
        id: String,
    },
    Attrib {
        selector: Box<Tree>,
        namespace: Option<String>,
        attrib: String,
        operator: AttribOp,
        value: Option<String>,
    },
    Pseudo {
        selector: Box<Tree>,
        ident: String,
    },
    Function {
        selector: Box<Tree>,
        name: String,
        arguments: Vec<Token>,
    },
    Negation {
        selector: Box<Tree>,
        subselector: Box<Tree>,
    },
    /// `:has()`.
    Relation {
        selector: Box<Tree>,
        combinator: Combinator,
        subselector: Box<Tree>,
    },
    /// `:is()` and `:matches()`.
    Matching {
        selector: Box<Tree>,
        selector_list: Vec<Tree>,
    },
    /// `:where()`.
    SpecificityAdjustment {
        selector: Box<Tree>,
        selector_list: Vec<Tree>,
    },
    Combined {
        selector: Box<Tree>,
        combinator: Combinator,
        subselector: Box<Tree>,
    },
}

impl Tree {
    fn universal() -> Self {
        Self::Element {
            namespace: None,
            element: None,
        }
    }
}

/// A pseudo-element at the end of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {
    /// `::text`, selecting text children.
    Text,
    /// `::attr(name)`, selecting an attribute.
    Attr(String),
    /// `::attr()` with anything but a single identifier or string.
    InvalidAttr(Vec<Token>),
    /// Any other pseudo-element.
    Unknown { name: String, functional: bool },
}

impl PseudoElement {
    fn simple(name: &str) -> Self {
        match name {
            "text" => Self::Text,
            _ => Self::Unknown {
                name: name.to_owned(),
                functional: false,
            },
        }
    }

    fn functional(name: &str, arguments: Vec<Token>) -> Self {
        if name != "attr" {
            return Self::Unknown {
                name: name.to_owned(),
                functional: true,
            };
        }
        match arguments.as_slice() {
            [arg] if matches!(arg.kind, TokenKind::Ident | TokenKind::String) => {
                Self::Attr(arg.value.clone())
            }
            _ => Self::InvalidAttr(arguments),
        }
    }
}

impl fmt::Display for PseudoElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Attr(name) => write!(f, "attr({name})"),
            Self::InvalidAttr(_) => f.write_str("attr()"),
            Self::Unknown {
                name,
                functional: true,
            } => write!(f, "{name}()"),
            Self::Unknown { name, .. } => f.write_str(name),
        }
    }
}

/// One selector of a comma-separated group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub tree: Tree,
    pub pseudo_element: Option<PseudoElement>,
}

/// Parses a selector group into its selectors.
///
/// # Errors
///
/// Returns [`CssError::Syntax`] for malformed input.
pub fn parse(css: &str) -> Result<Vec<Selector>, CssError> {
    let mut stream = TokenStream::new(tokenize(css)?);
    parse_selector_group(&mut stream)
}

// --- Tokenizer ---

fn is_css_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0c')
}

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic() || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c == '-' || c.is_ascii_digit()
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl Tokenizer<'_> {
    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Returns `true` if an escape sequence starts at the current position.
    fn at_escape(&self) -> bool {
        self.peek_char() == Some('\\')
            && self
                .peek_char_at(1)
                .is_some_and(|c| !matches!(c, '\n' | '\r' | '\x0c'))
    }

    /// Consumes an escape sequence (the backslash included).
    fn read_escape(&mut self) -> char {
        self.bump();
        let start = self.pos;
        while self.pos - start < 6 && self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return self.bump().unwrap_or('\u{FFFD}');
        }
        let code = u32::from_str_radix(&self.src[start..self.pos], 16).unwrap_or(0xFFFD);
        if self.src[self.pos..].starts_with("\r\n") {
            self.pos += 2;
        } else if self.peek_char().is_some_and(is_css_whitespace) {
            self.pos += 1;
        }
        char::from_u32(code).unwrap_or('\u{FFFD}')
    }

    fn at_hash(&self) -> bool {
        self.peek_char() == Some('#')
            && match self.peek_char_at(1) {
                Some('\\') => self
                    .peek_char_at(2)
                    .is_some_and(|c| !matches!(c, '\n' | '\r' | '\x0c')),
                next => next.is_some_and(is_name_char),
            }
    }

    fn at_name_start(&self) -> bool {
        self.peek_char().is_some_and(is_name_start) || self.at_escape()
    }

    fn at_ident_start(&self) -> bool {
        if self.peek_char() == Some('-') {
            let next = self.peek_char_at(1);
            next.is_some_and(is_name_start)
                || (next == Some('\\')
                    && self
                        .peek_char_at(2)
                        .is_some_and(|c| !matches!(c, '\n' | '\r' | '\x0c')))
        } else {
            self.at_name_start()
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        loop {
            if self.at_escape() {
                name.push(self.read_escape());
            } else if let Some(c) = self.peek_char().filter(|&c| is_name_char(c)) {
                name.push(c);
                self.pos += c.len_utf8();
            } else {
                return name;
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<String, CssError> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek_char() {
                None => return Err(CssError::syntax(format!("Unclosed string at {start}"), start)),
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(value);
                }
                Some('\\') => match self.peek_char_at(1) {
                    None => return Err(CssError::syntax(format!("Unclosed string at {start}"), start)),
                    Some('\n' | '\x0c') => self.pos += 2,
                    Some('\r') => {
                        self.pos += 2;
                        if self.peek_char() == Some('\n') {
                            self.pos += 1;
                        }
                    }
                    Some(_) => value.push(self.read_escape()),
                },
                Some('\n' | '\r' | '\x0c') => {
                    return Err(CssError::syntax(format!("Invalid string at {start}"), start));
                }
                Some(c) => {
                    value.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    /// Matches `[+-]?([0-9]*\.[0-9]+|[0-9]+)` at the current position.
    fn number_len(&self) -> Option<usize> {
        let bytes = &self.src.as_bytes()[self.pos..];
        let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
        let digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
        let after = sign + digits;
        if bytes.get(after) == Some(&b'.') {
            let fraction = bytes[after + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
            if fraction > 0 {
                return Some(after + 1 + fraction);
            }
        }
        (digits > 0).then_some(after)
    }
}

fn tokenize(css: &str) -> Result<Vec<Token>, CssError> {
    let mut tokens = Vec::new();
    let mut t = Tokenizer { src: css, pos: 0 };
    while let Some(c) = t.peek_char() {
        let start = t.pos;
        if is_css_whitespace(c) {
            while t.peek_char().is_some_and(is_css_whitespace) {
                t.pos += 1;
            }
            tokens.push(Token::new(TokenKind::Whitespace, " ", start));
        } else if t.at_ident_start() {
            let mut value = String::new();
            if c == '-' {
                value.push('-');
                t.pos += 1;
            }
            value.push_str(&t.read_name());
            tokens.push(Token::new(TokenKind::Ident, value, start));
        } else if t.at_hash() {
            t.pos += 1;
            let value = t.read_name();
            tokens.push(Token::new(TokenKind::Hash, value, start));
        } else if c == '"' || c == '\'' {
            let value = t.read_string(c)?;
            tokens.push(Token::new(TokenKind::String, value, start));
        } else if let Some(len) = t.number_len() {
            t.pos += len;
            tokens.push(Token::new(TokenKind::Number, &css[start..t.pos], start));
        } else if css[start..].starts_with("/*") {
            t.pos = css[start + 2..]
                .find("*/")
                .map_or(css.len(), |end| start + 2 + end + 2);
        } else {
            t.bump();
            tokens.push(Token::new(TokenKind::Delim, c, start));
        }
    }
    tokens.push(Token::new(TokenKind::Eof, "", css.len()));
    Ok(tokens)
}

// --- Parser ---

struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.index.min(last)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    /// Number of tokens consumed so far.
    fn used(&self) -> usize {
        self.index
    }

    fn skip_whitespace(&mut self) {
        while self.peek().kind == TokenKind::Whitespace {
            self.index += 1;
        }
    }

    fn next_ident(&mut self) -> Result<String, CssError> {
        let token = self.next();
        if token.kind == TokenKind::Ident {
            Ok(token.value)
        } else {
            Err(CssError::syntax(format!("Expected ident, got {token}"), token.pos))
        }
    }

    fn next_ident_or_star(&mut self) -> Result<Option<String>, CssError> {
        let token = self.next();
        match token.kind {
            TokenKind::Ident => Ok(Some(token.value)),
            _ if token.is_delim("*") => Ok(None),
            _ => Err(CssError::syntax(
                format!("Expected ident or '*', got {token}"),
                token.pos,
            )),
        }
    }
}

fn unexpected(what: &str, token: &Token) -> CssError {
    CssError::syntax(format!("{what}, got {token}"), token.pos)
}

fn parse_selector_group(stream: &mut TokenStream) -> Result<Vec<Selector>, CssError> {
    let mut selectors = Vec::new();
    stream.skip_whitespace();
    loop {
        selectors.push(parse_selector(stream)?);
        if stream.peek().is_delim(",") {
            stream.next();
            stream.skip_whitespace();
        } else {
            return Ok(selectors);
        }
    }
}

fn parse_selector(stream: &mut TokenStream) -> Result<Selector, CssError> {
    let (mut tree, mut pseudo_element) = parse_simple_selector(stream, false)?;
    loop {
        stream.skip_whitespace();
        let peek = stream.peek();
        if peek.is_eof() || peek.is_delim(",") {
            break;
        }
        if let Some(pseudo) = &pseudo_element {
            return Err(CssError::syntax(
                format!("Got pseudo-element ::{pseudo} not at the end of a selector"),
                peek.pos,
            ));
        }
        let combinator = if peek.is_delim("+>~") {
            let delim = stream.next().value;
            stream.skip_whitespace();
            Combinator::from_delim(&delim).unwrap_or(Combinator::Descendant)
        } else {
            Combinator::Descendant
        };
        let (next, next_pseudo) = parse_simple_selector(stream, false)?;
        tree = Tree::Combined {
            selector: Box::new(tree),
            combinator,
            subselector: Box::new(next),
        };
        pseudo_element = next_pseudo;
    }
    Ok(Selector {
        tree,
        pseudo_element,
    })
}

#[allow(clippy::too_many_lines)]
fn parse_simple_selector(
    stream: &mut TokenStream,
    inside_negation: bool,
) -> Result<(Tree, Option<PseudoElement>), CssError> {
    stream.skip_whitespace();
    let selector_start = stream.used();
    let peek = stream.peek();
    let mut result = if peek.kind == TokenKind::Ident || peek.is_delim("*") {
        let first = stream.next_ident_or_star()?;
        if stream.peek().is_delim("|") {
            stream.next();
            let element = stream.next_ident_or_star()?;
            Tree::Element {
                namespace: first,
                element,
            }
        } else {
            Tree::Element {
                namespace: None,
                element: first,
            }
        }
    } else {
        Tree::universal()
    };

    let mut pseudo_element: Option<PseudoElement> = None;
    loop {
        let peek = stream.peek().clone();
        if matches!(peek.kind, TokenKind::Whitespace | TokenKind::Eof)
            || peek.is_delim(",+>~")
            || (inside_negation && peek.is_delim(")"))
        {
            break;
        }
        if let Some(pseudo) = &pseudo_element {
            return Err(CssError::syntax(
                format!("Got pseudo-element ::{pseudo} not at the end of a selector"),
                peek.pos,
            ));
        }
        if peek.kind == TokenKind::Hash {
            stream.next();
            result = Tree::Hash {
                selector: Box::new(result),
                id: peek.value,
            };
        } else if peek.is_delim(".") {
            stream.next();
            result = Tree::Class {
                selector: Box::new(result),
                class_name: stream.next_ident()?,
            };
        } else if peek.is_delim("|") {
            stream.next();
            result = Tree::Element {
                namespace: None,
                element: Some(stream.next_ident()?),
            };
        } else if peek.is_delim("[") {
            stream.next();
            result = parse_attrib(result, stream)?;
        } else if peek.is_delim(":") {
            stream.next();
            if stream.peek().is_delim(":") {
                stream.next();
                let name = stream.next_ident()?.to_ascii_lowercase();
                pseudo_element = Some(if stream.peek().is_delim("(") {
                    stream.next();
                    PseudoElement::functional(&name, parse_arguments(stream)?)
                } else {
                    PseudoElement::simple(&name)
                });
                continue;
            }
            let ident = stream.next_ident()?.to_ascii_lowercase();
            if matches!(
                ident.as_str(),
                "first-line" | "first-letter" | "before" | "after"
            ) {
                // CSS 2.1 pseudo-elements may use a single colon.
                pseudo_element = Some(PseudoElement::simple(&ident));
                continue;
            }
            if !stream.peek().is_delim("(") {
                if ident == "scope" && result == Tree::universal() {
                    let used = stream.used();
                    let leading_space = stream.tokens[0].kind == TokenKind::Whitespace;
                    if !(used == 2 || (used == 3 && leading_space)) {
                        return Err(CssError::syntax(
                            "Got immediate child pseudo-element \":scope\" not at the start of a selector",
                            peek.pos,
                        ));
                    }
                }
                result = Tree::Pseudo {
                    selector: Box::new(result),
                    ident,
                };
                continue;
            }
            stream.next();
            stream.skip_whitespace();
            result = match ident.as_str() {
                "not" => {
                    if inside_negation {
                        return Err(CssError::syntax("Got nested :not()", peek.pos));
                    }
                    let (argument, argument_pseudo) = parse_simple_selector(stream, true)?;
                    let next = stream.next();
                    if let Some(pseudo) = argument_pseudo {
                        return Err(CssError::syntax(
                            format!("Got pseudo-element ::{pseudo} inside :not() at {}", next.pos),
                            next.pos,
                        ));
                    }
                    if !next.is_delim(")") {
                        return Err(unexpected("Expected ')'", &next));
                    }
                    Tree::Negation {
                        selector: Box::new(result),
                        subselector: Box::new(argument),
                    }
                }
                "has" => {
                    let (combinator, subselector) = parse_relative_selector(stream)?;
                    Tree::Relation {
                        selector: Box::new(result),
                        combinator,
                        subselector: Box::new(subselector),
                    }
                }
                "matches" | "is" => Tree::Matching {
                    selector: Box::new(result),
                    selector_list: parse_simple_selector_arguments(stream)?,
                },
                "where" => Tree::SpecificityAdjustment {
                    selector: Box::new(result),
                    selector_list: parse_simple_selector_arguments(stream)?,
                },
                _ => Tree::Function {
                    selector: Box::new(result),
                    name: ident,
                    arguments: parse_arguments(stream)?,
                },
            };
        } else {
            return Err(unexpected("Expected selector", &peek));
        }
    }
    if stream.used() == selector_start {
        return Err(unexpected("Expected selector", stream.peek()));
    }
    Ok((result, pseudo_element))
}

fn parse_arguments(stream: &mut TokenStream) -> Result<Vec<Token>, CssError> {
    let mut arguments = Vec::new();
    loop {
        stream.skip_whitespace();
        let next = stream.next();
        if matches!(
            next.kind,
            TokenKind::Ident | TokenKind::String | TokenKind::Number
        ) || next.is_delim("+-")
        {
            arguments.push(next);
        } else if next.is_delim(")") {
            return Ok(arguments);
        } else {
            return Err(unexpected("Expected an argument", &next));
        }
    }
}

/// Parses the argument of `:has()`: an optional leading combinator and a
/// compound selector, up to the closing parenthesis.
fn parse_relative_selector(stream: &mut TokenStream) -> Result<(Combinator, Tree), CssError> {
    stream.skip_whitespace();
    let mut next = stream.next();
    let combinator = if next.is_delim(">+~") {
        let combinator = Combinator::from_delim(&next.value).unwrap_or(Combinator::Descendant);
        stream.skip_whitespace();
        next = stream.next();
        combinator
    } else {
        Combinator::Descendant
    };
    let mut subselector = String::new();
    loop {
        if matches!(
            next.kind,
            TokenKind::Ident | TokenKind::String | TokenKind::Number
        ) || next.is_delim(".*")
        {
            subselector.push_str(&next.value);
        } else if next.is_delim(")") {
            let selector = parse(&subselector)?
                .into_iter()
                .next()
                .ok_or_else(|| unexpected("Expected an argument", &next))?;
            return Ok((combinator, selector.tree));
        } else {
            return Err(unexpected("Expected an argument", &next));
        }
        next = stream.next();
    }
}

fn parse_simple_selector_arguments(stream: &mut TokenStream) -> Result<Vec<Tree>, CssError> {
    let mut arguments = Vec::new();
    loop {
        let (tree, pseudo_element) = parse_simple_selector(stream, true)?;
        if let Some(pseudo) = pseudo_element {
            return Err(CssError::syntax(
                format!("Got pseudo-element ::{pseudo} inside function"),
                stream.peek().pos,
            ));
        }
        stream.skip_whitespace();
        let next = stream.next();
        if next.is_eof() || next.is_delim(",") {
            stream.skip_whitespace();
            arguments.push(tree);
            if next.is_eof() {
                return Err(unexpected("Expected an argument", &next));
            }
        } else if next.is_delim(")") {
            arguments.push(tree);
            return Ok(arguments);
        } else {
            return Err(unexpected("Expected an argument", &next));
        }
    }
}

fn parse_attrib(selector: Tree, stream: &mut TokenStream) -> Result<Tree, CssError> {
    stream.skip_whitespace();
    let first = stream.next_ident_or_star()?;
    if first.is_none() && !stream.peek().is_delim("|") {
        return Err(unexpected("Expected '|'", stream.peek()));
    }

    let mut operator = None;
    let (namespace, attrib) = if stream.peek().is_delim("|") {
        stream.next();
        if stream.peek().is_delim("=") {
            stream.next();
            operator = Some(AttribOp::DashMatch);
            (None, first)
        } else {
            (first, Some(stream.next_ident()?))
        }
    } else {
        (None, first)
    };
    // `[*|=x]` leaves no attribute name.
    let attrib = attrib.unwrap_or_else(|| "*".to_owned());

    let operator = match operator {
        Some(op) => op,
        None => {
            stream.skip_whitespace();
            let next = stream.next();
            if next.is_delim("]") {
                return Ok(Tree::Attrib {
                    selector: Box::new(selector),
                    namespace,
                    attrib,
                    operator: AttribOp::Exists,
                    value: None,
                });
            } else if next.is_delim("=") {
                AttribOp::Equals
            } else if next.is_delim("^$*~|!") && stream.peek().is_delim("=") {
                stream.next();
                match next.value.as_str() {
                    "^" => AttribOp::PrefixMatch,
                    "$" => AttribOp::SuffixMatch,
                    "*" => AttribOp::SubstringMatch,
                    "~" => AttribOp::Includes,
                    "|" => AttribOp::DashMatch,
                    _ => AttribOp::Different,
                }
            } else {
                return Err(unexpected("Operator expected", &next));
            }
        }
    };

    stream.skip_whitespace();
    let value = stream.next();
    if !matches!(value.kind, TokenKind::Ident | TokenKind::String) {
        return Err(unexpected("Expected string or ident", &value));
    }
    stream.skip_whitespace();
    let next = stream.next();
    if !next.is_delim("]") {
        return Err(unexpected("Expected ']'", &next));
    }
    Ok(Tree::Attrib {
        selector: Box::new(selector),
        namespace,
        attrib,
        operator,
        value: Some(value.value),
    })
}

/// Parses the `an+b` argument of the `:nth-*()` functions.
///
/// Returns `None` for anything that is not a valid series.
pub(crate) fn parse_series(tokens: &[Token]) -> Option<(i64, i64)> {
    if tokens.iter().any(|t| t.kind == TokenKind::String) {
        return None;
    }
    let joined: String = tokens.iter().map(|t| t.value.as_str()).collect();
    let s = joined.trim();
    match s {
        "odd" => return Some((2, 1)),
        "even" => return Some((2, 0)),
        "n" => return Some((1, 0)),
        _ => {}
    }
    let Some((a, b)) = s.split_once('n') else {
        return Some((0, s.parse().ok()?));
    };
    let a = match a {
        "" | "+" => 1,
        "-" => -1,
        _ => a.parse().ok()?,
    };
    let b = if b.is_empty() { 0 } else { b.parse().ok()? };
    Some((a, b))
}
