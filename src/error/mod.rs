//! Error types for selection, querying and tree mutation.
//!
//! Every fallible public operation returns [`Result`], whose error side is the
//! crate-wide [`Error`] enum. The query languages keep their own structured
//! errors ([`XPathError`], [`CssError`]) which are wrapped together with the
//! offending expression so callers always see the query text that failed.
//!
//! The variants fall into three groups:
//!
//! - **input errors**, raised while building a [`Selection`](crate::Selection)
//!   (`InvalidKind`, `MissingInput`, `RootKindMismatch`, `UnknownEncoding`);
//! - **query errors**, raised per call (`InvalidXPath`, `XPathEval`, `Css`,
//!   `InvalidJmesPath`, `UnsupportedKind`);
//! - **mutation errors**, raised by `drop()` (`CannotDropWithoutRoot`,
//!   `CannotDropWithoutParent`).

use crate::css::CssError;
use crate::xpath::XPathError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for all selection operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document kind name was not one of `html`, `xml`, `json` or `text`.
    #[error("Invalid type: {0}")]
    InvalidKind(String),

    /// Neither text, body nor a pre-built root was supplied.
    #[error("Selector needs text, body, or root arguments")]
    MissingInput,

    /// A tree node was supplied as root together with a JSON or TEXT kind.
    #[error("Selector got a tree node as root, and '{kind}' as type")]
    RootKindMismatch {
        /// The kind that was requested.
        kind: String,
    },

    /// The byte decoder does not know the requested encoding label.
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    /// The XPath expression could not be parsed.
    #[error("Invalid XPath: {query}")]
    InvalidXPath {
        /// The expression as given by the caller.
        query: String,
        /// The underlying syntax error.
        #[source]
        source: XPathError,
    },

    /// The XPath expression parsed but failed while being evaluated
    /// (undefined prefix, unregistered function, bad extension arguments).
    #[error("XPath error: {message} in {query}")]
    XPathEval {
        /// The expression as given by the caller.
        query: String,
        /// What went wrong.
        message: String,
    },

    /// The CSS selector could not be translated to XPath.
    #[error("Invalid CSS selector {query:?}: {source}")]
    Css {
        /// The selector as given by the caller.
        query: String,
        /// The syntax or expression error.
        #[source]
        source: CssError,
    },

    /// The JMESPath expression could not be compiled or evaluated.
    #[error("Invalid JMESPath: {query} ({message})")]
    InvalidJmesPath {
        /// The expression as given by the caller.
        query: String,
        /// The message reported by the JMESPath engine.
        message: String,
    },

    /// The operation is not available for this kind of selection.
    #[error("Cannot use {operation} on a Selector of type '{kind}'")]
    UnsupportedKind {
        /// The operation that was attempted (`xpath`, `css`, ...).
        operation: &'static str,
        /// The kind of the selection, lower-case.
        kind: &'static str,
    },

    /// `drop()` was called on a selection that does not reference a tree
    /// node, such as a text or attribute result.
    #[error("The node you're trying to drop has no root, are you trying to drop a pseudo-element? Try to use 'li' as a selector instead of 'li::text' or '//li' instead of '//li/text()', for example.")]
    CannotDropWithoutRoot,

    /// `drop()` was called on the root element of a document.
    #[error("The node you're trying to remove has no parent, are you trying to remove a root element?")]
    CannotDropWithoutParent,
}

impl Error {
    /// Returns `true` for errors raised by `drop()`.
    #[must_use]
    pub fn is_drop_error(&self) -> bool {
        matches!(
            self,
            Self::CannotDropWithoutRoot | Self::CannotDropWithoutParent
        )
    }
}
