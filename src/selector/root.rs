//! Root construction and kind inference.
//!
//! Text input is tried as JSON first unless the caller asked for a tree
//! kind; anything that is not JSON is parsed as HTML (the default) or XML.
//! Pre-built roots skip parsing but are still checked against the
//! requested kind.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use super::{Backing, Kind};
use crate::error::{Error, Result};
use crate::html::parse_html_with;
use crate::parser::{parse_xml_with, ParseOptions};
use crate::tree::{Document, Flavor, NodeId};

/// A value handed to a [`SelectionBuilder`](super::SelectionBuilder) in
/// place of text.
#[derive(Debug, Clone)]
pub enum Root {
    /// An already parsed document. Its root element becomes the selection.
    Document(Document),
    /// A decoded JSON value.
    Json(Value),
    /// A plain string. Valid JSON text becomes a JSON selection when no
    /// kind is given; any other string is used as is.
    Text(String),
}

impl From<Document> for Root {
    fn from(doc: Document) -> Self {
        Self::Document(doc)
    }
}

impl From<Value> for Root {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Resolves text input to a kind and a backing value.
pub(crate) fn from_text(
    text: String,
    kind: Option<Kind>,
    base_url: Option<&str>,
    options: &ParseOptions,
) -> (Kind, Backing) {
    if kind == Some(Kind::Text) {
        return (Kind::Text, Backing::Text(text));
    }
    if matches!(kind, None | Some(Kind::Json)) {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => return (Kind::Json, Backing::Json(value)),
            Err(err) if kind == Some(Kind::Json) => {
                tracing::debug!(error = %err, "text is not JSON, parsing as HTML");
            }
            Err(_) => {}
        }
    }
    let kind = match kind {
        Some(Kind::Xml) => Kind::Xml,
        _ => Kind::Html,
    };
    (kind, parse_document(&text, kind, base_url, options))
}

/// Parses `text` into a shared tree and points the backing at its root
/// element.
pub(crate) fn parse_document(
    text: &str,
    kind: Kind,
    base_url: Option<&str>,
    options: &ParseOptions,
) -> Backing {
    let (doc, id) = parse_tree(text, kind, base_url, options);
    Backing::Node { doc, id }
}

/// Parses `text` and returns the shared tree with its root element.
pub(crate) fn parse_tree(
    text: &str,
    kind: Kind,
    base_url: Option<&str>,
    options: &ParseOptions,
) -> (Rc<RefCell<Document>>, NodeId) {
    let mut doc = match kind {
        Kind::Xml => parse_xml_with(text, options),
        _ => parse_html_with(text, options),
    };
    doc.url = base_url.map(str::to_owned);
    share(doc)
}

fn share(doc: Document) -> (Rc<RefCell<Document>>, NodeId) {
    let id = doc.root_element().unwrap_or_else(|| doc.root());
    (Rc::new(RefCell::new(doc)), id)
}

/// Resolves a pre-built root to a kind and a backing value.
pub(crate) fn from_root(root: Root, kind: Option<Kind>) -> Result<(Kind, Backing)> {
    match root {
        Root::Document(doc) => {
            let kind = match kind {
                Some(k @ (Kind::Json | Kind::Text)) => {
                    return Err(Error::RootKindMismatch {
                        kind: k.as_str().to_owned(),
                    })
                }
                Some(k) => k,
                None => match doc.flavor() {
                    Flavor::Html => Kind::Html,
                    Flavor::Xml => Kind::Xml,
                },
            };
            let (doc, id) = share(doc);
            Ok((kind, Backing::Node { doc, id }))
        }
        Root::Json(value) => Ok((Kind::Json, Backing::Json(value))),
        Root::Text(text) => match kind {
            Some(Kind::Json) => {
                let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
                Ok((Kind::Json, Backing::Json(value)))
            }
            Some(kind) => Ok((kind, Backing::Text(text))),
            // Valid JSON text is JSON; anything else stays a rootless string.
            None => match serde_json::from_str::<Value>(&text) {
                Ok(value) => Ok((Kind::Json, Backing::Json(value))),
                Err(_) => Ok((Kind::Html, Backing::Text(text))),
            },
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn text(input: &str, kind: Option<Kind>) -> (Kind, Backing) {
        from_text(input.to_owned(), kind, None, &ParseOptions::default())
    }

    #[test]
    fn test_json_detected_without_hint() {
        let (kind, backing) = text(r#"{"a": 1}"#, None);
        assert_eq!(kind, Kind::Json);
        assert!(matches!(backing, Backing::Json(Value::Object(_))));
    }

    #[test]
    fn test_json_scalars_and_null_are_json() {
        assert_eq!(text("null", None).0, Kind::Json);
        assert_eq!(text("12", None).0, Kind::Json);
        assert_eq!(text("\"s\"", None).0, Kind::Json);
    }

    #[test]
    fn test_explicit_html_skips_json() {
        let (kind, backing) = text("12", Some(Kind::Html));
        assert_eq!(kind, Kind::Html);
        assert!(matches!(backing, Backing::Node { .. }));
    }

    #[test]
    fn test_json_hint_falls_back_to_html() {
        let (kind, _) = text("<p>not json</p>", Some(Kind::Json));
        assert_eq!(kind, Kind::Html);
    }

    #[test]
    fn test_text_kind_keeps_raw_string() {
        let (kind, backing) = text("<b>x</b>", Some(Kind::Text));
        assert_eq!(kind, Kind::Text);
        assert!(matches!(backing, Backing::Text(ref s) if s == "<b>x</b>"));
    }

    #[test]
    fn test_empty_input_becomes_html_element() {
        let (_, backing) = text("  \0 ", None);
        let Backing::Node { doc, id } = backing else {
            panic!("expected a tree");
        };
        assert_eq!(doc.borrow().node_name(id), Some("html"));
    }

    #[test]
    fn test_base_url_stored_on_document() {
        let (_, backing) = from_text(
            "<p/>".to_owned(),
            Some(Kind::Xml),
            Some("http://example.com/"),
            &ParseOptions::default(),
        );
        let Backing::Node { doc, .. } = backing else {
            panic!("expected a tree");
        };
        assert_eq!(doc.borrow().url.as_deref(), Some("http://example.com/"));
    }

    #[test]
    fn test_document_root_rejects_json_and_text() {
        let doc = crate::parser::parse_xml("<a/>");
        let err = from_root(Root::Document(doc.clone()), Some(Kind::Json)).unwrap_err();
        assert!(matches!(err, Error::RootKindMismatch { ref kind } if kind == "json"));
        assert!(from_root(Root::Document(doc.clone()), Some(Kind::Text)).is_err());
        assert_eq!(from_root(Root::Document(doc), None).unwrap().0, Kind::Xml);
    }

    #[test]
    fn test_json_root_infers_json() {
        let (kind, _) = from_root(Root::Json(serde_json::json!([1, 2])), None).unwrap();
        assert_eq!(kind, Kind::Json);
    }

    #[test]
    fn test_text_root_defaults_to_html() {
        let (kind, backing) = from_root(Root::Text("plain".to_owned()), None).unwrap();
        assert_eq!(kind, Kind::Html);
        assert!(matches!(backing, Backing::Text(_)));
    }

    #[test]
    fn test_text_root_holding_json_infers_json() {
        let (kind, backing) = from_root(Root::Text("[1,2]".to_owned()), None).unwrap();
        assert_eq!(kind, Kind::Json);
        assert!(matches!(backing, Backing::Json(Value::Array(ref items)) if items.len() == 2));

        let (kind, _) = from_root(Root::Text("null".to_owned()), None).unwrap();
        assert_eq!(kind, Kind::Json);

        let (kind, backing) = from_root(Root::Text("[1,2]".to_owned()), Some(Kind::Html)).unwrap();
        assert_eq!(kind, Kind::Html);
        assert!(matches!(backing, Backing::Text(_)));
    }
}
