//! CSS selectors, translated to `XPath` 1.0.
//!
//! The [`parser`] turns a selector group into a [`parser::Selector`] tree;
//! the [`translator`] walks that tree and produces an expression the
//! [`xpath`](crate::xpath) engine evaluates. Besides CSS Level 3 (plus
//! `:has()`, `:is()`, `:where()`, `:contains()` and `[attr!=value]`), two
//! pseudo-elements are understood:
//!
//! - `::text` selects text children;
//! - `::attr(name)` selects the value of attribute `name`.
//!
//! ```
//! use seloxide::css::css2xpath;
//!
//! assert_eq!(css2xpath("a::attr(href)").unwrap(), "descendant-or-self::a/@href");
//! assert_eq!(
//!     css2xpath("p::text, a::text").unwrap(),
//!     "descendant-or-self::p/text() | descendant-or-self::a/text()"
//! );
//! ```

pub mod parser;
pub mod translator;

pub use translator::{
    css2xpath, xpath_literal, Translator, XPathExpr, DEFAULT_PREFIX, GENERIC_TRANSLATOR,
    HTML_TRANSLATOR,
};

/// A selector that could not be parsed or translated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CssError {
    /// Malformed selector text.
    #[error("{message}")]
    Syntax {
        /// Human-readable description, including the offending token.
        message: String,
        /// Byte offset in the selector where the problem was found.
        position: usize,
    },
    /// Well-formed selector with no `XPath` equivalent.
    #[error("{0}")]
    Expression(String),
}

impl CssError {
    pub(crate) fn syntax(message: impl Into<String>, position: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Returns `true` for [`CssError::Syntax`].
    #[must_use]
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }
}
