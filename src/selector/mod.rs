//! Selections: typed handles on query results.
//!
//! A [`Selection`] wraps one value (a tree node, a JSON value, a string or
//! an `XPath` scalar) together with its [`Kind`] and the namespace prefixes
//! used when querying it. Queries never modify a selection; they return a
//! [`SelectionList`] of new selections. `drop` and `remove_namespaces`
//! mutate the shared tree in place.
//!
//! # Examples
//!
//! ```
//! use seloxide::Selection;
//!
//! let sel = Selection::new(r#"<ul><li id="1">1</li><li id="2">2</li></ul>"#);
//! assert_eq!(sel.css("li::text").unwrap().getall(), ["1", "2"]);
//! assert_eq!(
//!     sel.xpath(r#"//li[@id="2"]/text()"#).unwrap().get().as_deref(),
//!     Some("2")
//! );
//! ```

mod list;
mod root;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use once_cell::unsync::OnceCell;
use regex::Regex;
use serde_json::Value;

use crate::css::{GENERIC_TRANSLATOR, HTML_TRANSLATOR};
use crate::encoding;
use crate::error::{Error, Result};
use crate::parser::ParseOptions;
use crate::serial::{node_to_html, node_to_xml};
use crate::tree::{Document, NodeId, NodeKind};
use crate::util::extract_regex;
use crate::xpath::exslt::{REGEXP_NAMESPACE, SETS_NAMESPACE};
use crate::xpath::{parser as xpath_parser, XPathContext, XPathNode, XPathValue};

pub use list::SelectionList;
pub use root::Root;

/// Document model of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// An HTML tree, queried with HTML CSS semantics.
    Html,
    /// An XML tree.
    Xml,
    /// A JSON value, queried with JMESPath.
    Json,
    /// Raw text, parsed as HTML on first tree query.
    Text,
}

impl Kind {
    /// Returns the lower-case name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "html" => Ok(Self::Html),
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            _ => Err(Error::InvalidKind(s.to_owned())),
        }
    }
}

/// The value a selection stands for.
#[derive(Debug, Clone)]
pub enum Backing {
    /// A node of a tree shared with other selections.
    Node {
        /// The tree.
        doc: Rc<RefCell<Document>>,
        /// The selected node.
        id: NodeId,
    },
    /// A string: raw TEXT input, a text node or an attribute value.
    Text(String),
    /// An `XPath` boolean result.
    Bool(bool),
    /// An `XPath` number result.
    Number(f64),
    /// A JSON value.
    Json(Value),
}

/// Per-call `XPath` settings.
///
/// Namespaces given here take precedence over the ones registered on the
/// selection but are not kept after the call.
///
/// ```
/// use seloxide::{Selection, XPathOptions};
///
/// let sel = Selection::new("<p class='a'>x</p><p class='b'>y</p>");
/// let opts = XPathOptions::new().variable("cls", "b");
/// let found = sel.xpath_with("//p[@class = $cls]/text()", &opts).unwrap();
/// assert_eq!(found.getall(), ["y"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct XPathOptions {
    namespaces: Vec<(String, String)>,
    variables: Vec<(String, XPathValue)>,
}

impl XPathOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `prefix` to `uri` for this call only.
    #[must_use]
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), uri.into()));
        self
    }

    /// Binds `$name` to a string, number or boolean.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<XPathValue>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }
}

/// Builder for root selections.
///
/// Exactly one of `text`, `body` or `root` should be set. When several
/// are, `text` wins over `body`, which wins over `root`.
///
/// ```
/// use seloxide::{Kind, SelectionBuilder};
///
/// let sel = SelectionBuilder::new()
///     .body(b"<r><v>caf\xe9</v></r>".to_vec())
///     .encoding("latin1")
///     .kind(Kind::Xml)
///     .build()
///     .unwrap();
/// assert_eq!(sel.xpath("//v/text()").unwrap().get().as_deref(), Some("café"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectionBuilder {
    text: Option<String>,
    body: Option<Vec<u8>>,
    encoding: Option<String>,
    kind: Option<Kind>,
    namespaces: Vec<(String, String)>,
    root: Option<Root>,
    base_url: Option<String>,
    size_guard: bool,
}

impl SelectionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the input text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the input bytes, decoded with [`encoding`](Self::encoding).
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the label used to decode `body`. Defaults to UTF-8.
    #[must_use]
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Forces the document kind instead of inferring it.
    #[must_use]
    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Registers a namespace prefix on the built selection.
    #[must_use]
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), uri.into()));
        self
    }

    /// Uses a pre-built value instead of parsing text.
    #[must_use]
    pub fn root(mut self, root: impl Into<Root>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Records the URL the document was loaded from.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Bounds tree depth and text node size while parsing.
    #[must_use]
    pub fn size_guard(mut self, yes: bool) -> Self {
        self.size_guard = yes;
        self
    }

    /// Builds the root selection.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingInput`] if no input was given;
    /// - [`Error::UnknownEncoding`] for an unknown `encoding` label;
    /// - [`Error::RootKindMismatch`] for a document root with a JSON or
    ///   TEXT kind.
    pub fn build(self) -> Result<Selection> {
        let options = ParseOptions::default().size_guard(self.size_guard);
        let base_url = self.base_url.as_deref();
        let (kind, backing) = if let Some(text) = self.text {
            if self.root.is_some() {
                tracing::warn!("both text and root given, ignoring root");
            }
            root::from_text(text, self.kind, base_url, &options)
        } else if let Some(body) = self.body {
            let text = encoding::decode(&body, self.encoding.as_deref())?;
            root::from_text(text, self.kind, base_url, &options)
        } else if let Some(root) = self.root {
            root::from_root(root, self.kind)?
        } else {
            return Err(Error::MissingInput);
        };

        let mut selection = Selection::with_parts(kind, backing, default_namespaces(), None);
        for (prefix, uri) in self.namespaces {
            selection.register_namespace(prefix, uri);
        }
        Ok(selection)
    }
}

fn default_namespaces() -> HashMap<String, String> {
    HashMap::from([
        ("re".to_owned(), REGEXP_NAMESPACE.to_owned()),
        ("set".to_owned(), SETS_NAMESPACE.to_owned()),
    ])
}

/// A typed handle on a document, or on one result of a query.
#[derive(Clone)]
pub struct Selection {
    kind: Kind,
    backing: Backing,
    namespaces: HashMap<String, String>,
    expr: Option<String>,
    html_root: OnceCell<(Rc<RefCell<Document>>, NodeId)>,
}

impl Selection {
    /// Builds a selection from text, inferring JSON or defaulting to HTML.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let (kind, backing) = root::from_text(text.into(), None, None, &ParseOptions::default());
        Self::with_parts(kind, backing, default_namespaces(), None)
    }

    /// Returns a builder for more control over the input.
    #[must_use]
    pub fn builder() -> SelectionBuilder {
        SelectionBuilder::new()
    }

    fn with_parts(
        kind: Kind,
        backing: Backing,
        namespaces: HashMap<String, String>,
        expr: Option<String>,
    ) -> Self {
        Self {
            kind,
            backing,
            namespaces,
            expr,
            html_root: OnceCell::new(),
        }
    }

    /// Returns the document kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Returns the selected value.
    #[must_use]
    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    /// Returns the query that produced this selection.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.expr.as_deref()
    }

    /// Returns the registered namespace prefixes.
    #[must_use]
    pub fn namespaces(&self) -> &HashMap<String, String> {
        &self.namespaces
    }

    /// Returns the URL the backing document was loaded from.
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        match &self.backing {
            Backing::Node { doc, .. } => doc.borrow().url.clone(),
            _ => None,
        }
    }

    /// Runs an `XPath` query.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedKind`] on a JSON selection;
    /// - [`Error::InvalidXPath`] for a malformed expression;
    /// - [`Error::XPathEval`] when evaluation fails, e.g. on an undefined
    ///   prefix or an unregistered function.
    pub fn xpath(&self, query: &str) -> Result<SelectionList> {
        self.xpath_with(query, &XPathOptions::default())
    }

    /// Runs an `XPath` query with extra namespaces and variables.
    ///
    /// # Errors
    ///
    /// See [`xpath`](Self::xpath).
    pub fn xpath_with(&self, query: &str, options: &XPathOptions) -> Result<SelectionList> {
        let (doc, node) = match (&self.kind, &self.backing) {
            (Kind::Json, _) => {
                return Err(Error::UnsupportedKind {
                    operation: "xpath",
                    kind: Kind::Json.as_str(),
                })
            }
            (Kind::Text, _) => self.text_as_html(),
            (_, Backing::Node { doc, id }) => (Rc::clone(doc), *id),
            _ => return Ok(SelectionList::default()),
        };

        let expr = xpath_parser::parse(query).map_err(|source| Error::InvalidXPath {
            query: query.to_owned(),
            source,
        })?;
        let result = {
            let mut tree = doc.borrow_mut();
            let mut ctx = XPathContext::new(&mut tree, XPathNode::Tree(node));
            for (prefix, uri) in &self.namespaces {
                ctx.set_namespace(prefix, uri);
            }
            for (prefix, uri) in &options.namespaces {
                ctx.set_namespace(prefix, uri);
            }
            for (name, value) in &options.variables {
                ctx.set_variable(name, value.clone());
            }
            ctx.evaluate(&expr)
        };
        let value = result.map_err(|err| {
            if err.is_syntax_error() {
                Error::InvalidXPath {
                    query: query.to_owned(),
                    source: err,
                }
            } else {
                Error::XPathEval {
                    query: query.to_owned(),
                    message: err.message,
                }
            }
        })?;

        let items = match value {
            XPathValue::NodeSet(nodes) => nodes
                .into_iter()
                .map(|node| result_backing(&doc, node))
                .collect(),
            XPathValue::Boolean(b) => vec![Backing::Bool(b)],
            XPathValue::Number(n) => vec![Backing::Number(n)],
            XPathValue::String(s) => vec![Backing::Text(s)],
        };
        let kind = if self.kind == Kind::Xml {
            Kind::Xml
        } else {
            Kind::Html
        };
        Ok(items
            .into_iter()
            .map(|backing| {
                Self::with_parts(kind, backing, self.namespaces.clone(), Some(query.to_owned()))
            })
            .collect())
    }

    /// Lazily parses TEXT input as HTML. The tree is built once per
    /// selection and never replaces the raw text.
    fn text_as_html(&self) -> (Rc<RefCell<Document>>, NodeId) {
        self.html_root
            .get_or_init(|| {
                let text = match &self.backing {
                    Backing::Text(text) => text.clone(),
                    _ => self.get(),
                };
                root::parse_tree(&text, Kind::Html, None, &ParseOptions::default())
            })
            .clone()
    }

    /// Runs a CSS query. `::text` and `::attr(name)` select text children
    /// and attribute values.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedKind`] on a JSON selection;
    /// - [`Error::Css`] for a selector that does not parse or translate;
    /// - any error of [`xpath`](Self::xpath).
    pub fn css(&self, query: &str) -> Result<SelectionList> {
        let translator = match self.kind {
            Kind::Json => {
                return Err(Error::UnsupportedKind {
                    operation: "css",
                    kind: Kind::Json.as_str(),
                })
            }
            Kind::Xml => &*GENERIC_TRANSLATOR,
            Kind::Html | Kind::Text => &*HTML_TRANSLATOR,
        };
        let xpath = translator
            .css_to_xpath(query)
            .map_err(|source| Error::Css {
                query: query.to_owned(),
                source,
            })?;
        self.xpath(&xpath)
    }

    /// Runs a JMESPath query.
    ///
    /// Tree selections are queried through their text content, parsed as
    /// JSON; when that is not JSON the result is empty. String results
    /// become TEXT selections, so HTML embedded in JSON can be queried
    /// further.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJmesPath`] when the query does not compile
    /// or fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use seloxide::Selection;
    ///
    /// let sel = Selection::new(r#"{"a": [1, 2, 3]}"#);
    /// assert_eq!(sel.jmespath("a[1]").unwrap().get().as_deref(), Some("2"));
    /// assert_eq!(sel.jmespath("a").unwrap().len(), 3);
    /// ```
    pub fn jmespath(&self, query: &str) -> Result<SelectionList> {
        let expr = jmespath::compile(query).map_err(|err| jmespath_error(query, &err))?;
        self.search(query, &expr)
    }

    /// Runs a JMESPath query compiled with a custom runtime, for example one
    /// with extra functions registered.
    ///
    /// # Errors
    ///
    /// See [`jmespath`](Self::jmespath).
    pub fn jmespath_with(&self, query: &str, runtime: &jmespath::Runtime) -> Result<SelectionList> {
        let expr = runtime
            .compile(query)
            .map_err(|err| jmespath_error(query, &err))?;
        self.search(query, &expr)
    }

    fn search(&self, query: &str, expr: &jmespath::Expression<'_>) -> Result<SelectionList> {
        let Some(data) = self.json_data() else {
            return Ok(SelectionList::default());
        };
        let found = expr
            .search(&data)
            .map_err(|err| jmespath_error(query, &err))?;
        let value = serde_json::to_value(&*found).map_err(|err| Error::InvalidJmesPath {
            query: query.to_owned(),
            message: err.to_string(),
        })?;
        let items = match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items,
            other => vec![other],
        };
        Ok(items
            .into_iter()
            .map(|item| {
                let expr = Some(query.to_owned());
                match item {
                    Value::String(text) => {
                        Self::with_parts(Kind::Text, Backing::Text(text), default_namespaces(), expr)
                    }
                    other => {
                        Self::with_parts(Kind::Json, Backing::Json(other), default_namespaces(), expr)
                    }
                }
            })
            .collect())
    }

    fn json_data(&self) -> Option<Value> {
        match &self.backing {
            Backing::Json(value) => Some(value.clone()),
            Backing::Text(text) => serde_json::from_str(text).ok(),
            Backing::Node { doc, id } => serde_json::from_str(&doc.borrow().text_content(*id)).ok(),
            Backing::Bool(b) => Some(Value::Bool(*b)),
            Backing::Number(n) => serde_json::Number::from_f64(*n).map(Value::Number),
        }
    }

    /// Serializes the selection.
    ///
    /// Tree nodes are written with the output method of the selection's
    /// kind and without their tail text. Strings are returned as they are,
    /// booleans as `1`/`0`, and other JSON values as JSON text.
    #[must_use]
    pub fn get(&self) -> String {
        match &self.backing {
            Backing::Node { doc, id } => {
                let doc = doc.borrow();
                match self.kind {
                    Kind::Xml => node_to_xml(&doc, *id),
                    _ => node_to_html(&doc, *id),
                }
            }
            Backing::Text(text) => text.clone(),
            Backing::Bool(b) => if *b { "1" } else { "0" }.to_owned(),
            Backing::Number(n) => format_float(*n),
            Backing::Json(Value::String(text)) => text.clone(),
            Backing::Json(value) => value.to_string(),
        }
    }

    /// Same as [`get`](Self::get), as a one-element list.
    #[must_use]
    pub fn getall(&self) -> Vec<String> {
        vec![self.get()]
    }

    /// Alias of [`get`](Self::get).
    #[must_use]
    pub fn extract(&self) -> String {
        self.get()
    }

    /// Alias of [`getall`](Self::getall).
    #[must_use]
    pub fn extract_all(&self) -> Vec<String> {
        self.getall()
    }

    /// Returns `true` when the serialized selection is not empty.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !self.get().is_empty()
    }

    /// Returns the attributes of an element, keyed by `{uri}name` for
    /// namespaced attributes. Empty for anything but elements.
    #[must_use]
    pub fn attrib(&self) -> BTreeMap<String, String> {
        let Backing::Node { doc, id } = &self.backing else {
            return BTreeMap::new();
        };
        doc.borrow()
            .attributes(*id)
            .iter()
            .map(|attr| (attr.clark_name(), attr.value.clone()))
            .collect()
    }

    /// Applies `regex` to the serialized selection.
    ///
    /// See [`extract_regex`] for how groups are handled. With
    /// `replace_entities`, character references other than `&amp;` and
    /// `&lt;` are decoded.
    #[must_use]
    pub fn re(&self, regex: &Regex, replace_entities: bool) -> Vec<String> {
        extract_regex(regex, &self.get(), replace_entities)
    }

    /// Returns the first match of [`re`](Self::re).
    #[must_use]
    pub fn re_first(&self, regex: &Regex, replace_entities: bool) -> Option<String> {
        self.re(regex, replace_entities).into_iter().next()
    }

    /// Registers a namespace prefix for later queries on this selection.
    ///
    /// Selections returned by earlier queries are not affected. JSON
    /// selections ignore the call.
    pub fn register_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        if self.kind == Kind::Json {
            tracing::warn!(%prefix, "namespaces are not used by JSON selections, ignoring");
            return;
        }
        self.namespaces.insert(prefix, uri.into());
    }

    /// Removes namespaces from every element of the selected subtree, so
    /// it can be queried with unprefixed names.
    pub fn remove_namespaces(&self) {
        if let Backing::Node { doc, id } = &self.backing {
            doc.borrow_mut().strip_namespaces(*id);
        }
    }

    /// Removes the selected node from its tree.
    ///
    /// In XML the text following the node goes with it; in HTML it stays
    /// in place.
    ///
    /// # Errors
    ///
    /// - [`Error::CannotDropWithoutRoot`] when the selection is not a tree
    ///   node, such as a `::text` result;
    /// - [`Error::CannotDropWithoutParent`] for the root element.
    pub fn drop(&self) -> Result<()> {
        let Backing::Node { doc, id } = &self.backing else {
            return Err(Error::CannotDropWithoutRoot);
        };
        let mut doc = doc.borrow_mut();
        let has_parent = doc
            .parent(*id)
            .is_some_and(|parent| !matches!(doc.node(parent).kind, NodeKind::Document));
        if !has_parent {
            return Err(Error::CannotDropWithoutParent);
        }
        if self.kind == Kind::Xml {
            doc.remove_with_tail(*id);
        } else {
            doc.drop_tree(*id);
        }
        Ok(())
    }
}

fn result_backing(doc: &Rc<RefCell<Document>>, node: XPathNode) -> Backing {
    let tree = doc.borrow();
    match node {
        XPathNode::Attribute { owner, index } => Backing::Text(
            tree.attributes(owner)
                .get(index)
                .map(|attr| attr.value.clone())
                .unwrap_or_default(),
        ),
        XPathNode::Tree(id) => match &tree.node(id).kind {
            NodeKind::Text { content } | NodeKind::CData { content } => {
                Backing::Text(content.clone())
            }
            _ => Backing::Node {
                doc: Rc::clone(doc),
                id,
            },
        },
    }
}

fn jmespath_error(query: &str, err: &jmespath::JmespathError) -> Error {
    Error::InvalidJmesPath {
        query: query.to_owned(),
        message: err.to_string(),
    }
}

/// Formats a float the shortest way that reads back exactly, always with
/// a fractional part or an exponent.
fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let repr = format!("{n:?}");
    match repr.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => repr,
    }
}

/// Quotes `s` for display, preferring single quotes.
fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

const REPR_DATA_CHARS: usize = 40;

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.get();
        let mut shown: String = data.chars().take(REPR_DATA_CHARS).collect();
        if shown.len() < data.len() {
            shown.push_str("...");
        }
        let query = self.expr.as_deref().map_or_else(|| "None".to_owned(), quote);
        write!(f, "<Selection query={query} data={}>", quote(&shown))
    }
}

impl AsRef<Selection> for Selection {
    fn as_ref(&self) -> &Selection {
        self
    }
}
