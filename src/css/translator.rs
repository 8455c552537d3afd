//! Selector tree to `XPath` 1.0 translation.
//!
//! Two flavors exist. The generic translator keeps names as written and
//! suits XML. The HTML translator lower-cases element and attribute names
//! and gives `:checked`, `:link`, `:enabled`, `:disabled` and `:lang()`
//! their HTML meaning.
//!
//! On top of standard selectors, the `::text` and `::attr(name)`
//! pseudo-elements select text children and attribute values.
//!
//! Each translator memoizes its results in a bounded LRU cache keyed by
//! selector and prefix.

use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use super::parser::{
    parse, parse_series, AttribOp, Combinator, PseudoElement, Selector, Token, TokenKind, Tree,
};
use super::CssError;

/// The prefix [`Translator::css_to_xpath`] puts before every selector.
pub const DEFAULT_PREFIX: &str = "descendant-or-self::";

/// Number of translations each translator keeps.
pub const CACHE_SIZE: usize = 256;

#[allow(clippy::expect_used)]
static SAFE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_.-]*$").expect("valid regex"));

/// A partial `XPath` expression: `path` + `element` + `[condition]`.
///
/// `textnode` and `attribute` record a trailing pseudo-element; they are
/// applied when the expression is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XPathExpr {
    pub path: String,
    pub element: String,
    pub condition: String,
    pub textnode: bool,
    pub attribute: Option<String>,
}

impl XPathExpr {
    fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            ..Self::default()
        }
    }

    fn add_condition(&mut self, condition: &str, conjunction: &str) {
        if self.condition.is_empty() {
            self.condition = condition.to_owned();
        } else {
            self.condition = format!("({}) {conjunction} ({condition})", self.condition);
        }
    }

    fn and(mut self, condition: &str) -> Self {
        self.add_condition(condition, "and");
        self
    }

    /// Moves the element name into the condition, leaving `*`.
    fn add_name_test(&mut self) {
        if self.element == "*" {
            return;
        }
        let test = format!("name() = {}", xpath_literal(&self.element));
        self.add_condition(&test, "and");
        self.element = "*".to_owned();
    }

    /// Appends `other` after `combiner`. Pseudo-element markers come from
    /// `other`, the rightmost part of the selector.
    fn join(mut self, combiner: &str, other: XPathExpr, closing: Option<&str>) -> Self {
        let mut path = format!("{self}{combiner}");
        if other.path != "*/" {
            path.push_str(&other.path);
        }
        self.path = path;
        match closing {
            None => {
                self.element = other.element;
                self.condition = other.condition;
            }
            // Relative selectors keep their condition inside the bracket.
            Some(closing) => {
                self.element = other.element;
                if !other.condition.is_empty() {
                    self.element = format!("{}[{}]", self.element, other.condition);
                }
                self.element.push_str(closing);
                self.condition = String::new();
            }
        }
        self.textnode = other.textnode;
        self.attribute = other.attribute;
        self
    }
}

impl fmt::Display for XPathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = format!("{}{}", self.path, self.element);
        if !self.condition.is_empty() {
            path = format!("{path}[{}]", self.condition);
        }
        if self.textnode {
            if path == "*" {
                path = "text()".to_owned();
            } else if let Some(stripped) = path.strip_suffix("::*/*") {
                path = format!("{stripped}::text()");
            } else {
                path.push_str("/text()");
            }
        }
        if let Some(attribute) = &self.attribute {
            if path.ends_with("::*/*") {
                path.truncate(path.len() - 2);
            }
            path = format!("{path}/@{attribute}");
        }
        f.write_str(&path)
    }
}

/// Quotes `s` as an `XPath` string literal.
///
/// ```
/// use seloxide::css::xpath_literal;
///
/// assert_eq!(xpath_literal("a"), "'a'");
/// assert_eq!(xpath_literal("it's"), "\"it's\"");
/// assert_eq!(xpath_literal(r#"'"'"#), r#"concat("'",'"',"'")"#);
/// ```
#[must_use]
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    if !s.contains('"') {
        return format!("\"{s}\"");
    }
    let mut parts = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        let quotes = rest.len() - rest.trim_start_matches('\'').len();
        let (part, tail) = if quotes > 0 {
            rest.split_at(quotes)
        } else {
            rest.split_at(rest.find('\'').unwrap_or(rest.len()))
        };
        parts.push(if part.contains('\'') {
            format!("\"{part}\"")
        } else {
            format!("'{part}'")
        });
        rest = tail;
    }
    format!("concat({})", parts.join(","))
}

fn is_safe_name(name: &str) -> bool {
    SAFE_NAME.is_match(name)
}

fn is_non_whitespace(s: &str) -> bool {
    !s.is_empty() && !s.contains([' ', '\t', '\r', '\n', '\x0c'])
}

fn format_arguments(arguments: &[Token]) -> String {
    let items: Vec<String> = arguments.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}

/// Returns the value of a lone identifier or string argument.
fn single_argument<'t>(arguments: &'t [Token], what: &str) -> Result<&'t str, CssError> {
    match arguments {
        [arg] if matches!(arg.kind, TokenKind::Ident | TokenKind::String) => Ok(&arg.value),
        _ => Err(CssError::Expression(format!(
            "Expected a single string or ident for {what}, got {}",
            format_arguments(arguments)
        ))),
    }
}

/// A CSS to `XPath` translator with its own translation cache.
pub struct Translator {
    html: bool,
    cache: Mutex<LruCache<(String, String), String>>,
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("html", &self.html)
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}

impl Translator {
    fn with_flavor(html: bool) -> Self {
        let capacity = NonZeroUsize::new(CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            html,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Creates a translator with XML semantics.
    #[must_use]
    pub fn generic() -> Self {
        Self::with_flavor(false)
    }

    /// Creates a translator with HTML semantics.
    #[must_use]
    pub fn html() -> Self {
        Self::with_flavor(true)
    }

    /// Translates `css` with the default `descendant-or-self::` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CssError::Syntax`] for a selector that does not parse and
    /// [`CssError::Expression`] for one that cannot be expressed in `XPath`
    /// (unknown pseudo-classes and pseudo-elements, bad arguments).
    ///
    /// # Examples
    ///
    /// ```
    /// use seloxide::css::Translator;
    ///
    /// let tr = Translator::html();
    /// assert_eq!(tr.css_to_xpath("p::text").unwrap(), "descendant-or-self::p/text()");
    /// assert_eq!(
    ///     tr.css_to_xpath("a ::attr(href)").unwrap(),
    ///     "descendant-or-self::a/descendant-or-self::*/@href"
    /// );
    /// ```
    pub fn css_to_xpath(&self, css: &str) -> Result<String, CssError> {
        self.css_to_xpath_with_prefix(css, DEFAULT_PREFIX)
    }

    /// Translates `css`, putting `prefix` before each selector of the group.
    ///
    /// # Errors
    ///
    /// See [`css_to_xpath`](Self::css_to_xpath).
    pub fn css_to_xpath_with_prefix(&self, css: &str, prefix: &str) -> Result<String, CssError> {
        let key = (css.to_owned(), prefix.to_owned());
        if let Some(hit) = self.cache.lock().get(&key) {
            return Ok(hit.clone());
        }
        let selectors = parse(css)?;
        let xpath = selectors
            .iter()
            .map(|selector| self.selector_to_xpath(selector, prefix))
            .collect::<Result<Vec<_>, _>>()?
            .join(" | ");
        tracing::trace!(css, xpath = %xpath, html = self.html, "translated selector");
        self.cache.lock().put(key, xpath.clone());
        Ok(xpath)
    }

    fn selector_to_xpath(&self, selector: &Selector, prefix: &str) -> Result<String, CssError> {
        let mut xpath = self.xpath(&selector.tree)?;
        match &selector.pseudo_element {
            None => {}
            Some(PseudoElement::Text) => {
                xpath.textnode = true;
                xpath.attribute = None;
            }
            Some(PseudoElement::Attr(name)) => {
                xpath.textnode = false;
                xpath.attribute = Some(name.clone());
            }
            Some(PseudoElement::InvalidAttr(arguments)) => {
                return Err(CssError::Expression(format!(
                    "Expected a single string or ident for ::attr(), got {}",
                    format_arguments(arguments)
                )));
            }
            Some(PseudoElement::Unknown {
                name,
                functional: true,
            }) => {
                return Err(CssError::Expression(format!(
                    "The functional pseudo-element ::{name}() is unknown"
                )));
            }
            Some(PseudoElement::Unknown { name, .. }) => {
                return Err(CssError::Expression(format!(
                    "The pseudo-element ::{name} is unknown"
                )));
            }
        }
        Ok(format!("{prefix}{xpath}"))
    }

    fn xpath(&self, tree: &Tree) -> Result<XPathExpr, CssError> {
        match tree {
            Tree::Element { namespace, element } => Ok(self.xpath_element(namespace.as_deref(), element.as_deref())),
            Tree::Combined {
                selector,
                combinator,
                subselector,
            } => {
                let left = self.xpath(selector)?;
                let right = self.xpath(subselector)?;
                Ok(combine(left, *combinator, right))
            }
            Tree::Negation {
                selector,
                subselector,
            } => {
                let xpath = self.xpath(selector)?;
                let mut sub = self.xpath(subselector)?;
                sub.add_name_test();
                if sub.condition.is_empty() {
                    Ok(xpath.and("0"))
                } else {
                    Ok(xpath.and(&format!("not({})", sub.condition)))
                }
            }
            Tree::Relation {
                selector,
                combinator,
                subselector,
            } => {
                let left = self.xpath(selector)?;
                let right = self.xpath(subselector)?;
                Ok(relate(left, *combinator, right))
            }
            Tree::Matching {
                selector,
                selector_list,
            }
            | Tree::SpecificityAdjustment {
                selector,
                selector_list,
            } => {
                let mut xpath = self.xpath(selector)?;
                for tree in selector_list {
                    let mut alternative = self.xpath(tree)?;
                    alternative.add_name_test();
                    if !alternative.condition.is_empty() {
                        xpath.add_condition(&alternative.condition, "or");
                    }
                }
                Ok(xpath)
            }
            Tree::Function {
                selector,
                name,
                arguments,
            } => self.xpath_function(self.xpath(selector)?, name, arguments),
            Tree::Pseudo { selector, ident } => self.xpath_pseudo(self.xpath(selector)?, ident),
            Tree::Attrib {
                selector,
                namespace,
                attrib,
                operator,
                value,
            } => {
                let name = if self.html {
                    attrib.to_ascii_lowercase()
                } else {
                    attrib.clone()
                };
                let mut safe = is_safe_name(&name);
                let name = match namespace {
                    Some(ns) => {
                        safe = safe && is_safe_name(ns);
                        format!("{ns}:{name}")
                    }
                    None => name,
                };
                let attrib = if safe {
                    format!("@{name}")
                } else {
                    format!("attribute::*[name() = {}]", xpath_literal(&name))
                };
                let xpath = self.xpath(selector)?;
                Ok(attrib_condition(xpath, *operator, &attrib, value.as_deref().unwrap_or_default()))
            }
            Tree::Class {
                selector,
                class_name,
            } => Ok(attrib_condition(
                self.xpath(selector)?,
                AttribOp::Includes,
                "@class",
                class_name,
            )),
            Tree::Hash { selector, id } => Ok(attrib_condition(
                self.xpath(selector)?,
                AttribOp::Equals,
                "@id",
                id,
            )),
        }
    }

    fn xpath_element(&self, namespace: Option<&str>, element: Option<&str>) -> XPathExpr {
        let (mut element, mut safe) = match element {
            None => ("*".to_owned(), true),
            Some(name) if self.html => (name.to_ascii_lowercase(), is_safe_name(name)),
            Some(name) => (name.to_owned(), is_safe_name(name)),
        };
        if let Some(ns) = namespace {
            element = format!("{ns}:{element}");
            safe = safe && is_safe_name(ns);
        }
        let mut xpath = XPathExpr::new(element);
        if !safe {
            xpath.add_name_test();
        }
        xpath
    }

    fn xpath_function(
        &self,
        xpath: XPathExpr,
        name: &str,
        arguments: &[Token],
    ) -> Result<XPathExpr, CssError> {
        match name {
            "nth-child" => nth_child(xpath, arguments, false, true),
            "nth-last-child" => nth_child(xpath, arguments, true, true),
            "nth-of-type" => {
                require_element(&xpath, "*:nth-of-type()")?;
                nth_child(xpath, arguments, false, false)
            }
            "nth-last-of-type" => {
                require_element(&xpath, "*:nth-of-type()")?;
                nth_child(xpath, arguments, true, false)
            }
            "contains" => {
                let value = single_argument(arguments, ":contains()")?;
                Ok(xpath.and(&format!("contains(., {})", xpath_literal(value))))
            }
            "lang" => {
                let value = single_argument(arguments, ":lang()")?;
                if self.html {
                    Ok(xpath.and(&format!(
                        "ancestor-or-self::*[@lang][1][starts-with(concat(\
                         translate(@lang, 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', \
                         'abcdefghijklmnopqrstuvwxyz'), '-'), {})]",
                        xpath_literal(&format!("{}-", value.to_lowercase()))
                    )))
                } else {
                    Ok(xpath.and(&format!("lang({})", xpath_literal(value))))
                }
            }
            _ => Err(CssError::Expression(format!(
                "The pseudo-class :{name}() is unknown"
            ))),
        }
    }

    fn xpath_pseudo(&self, xpath: XPathExpr, ident: &str) -> Result<XPathExpr, CssError> {
        let condition = match ident {
            "root" => "not(parent::*)".to_owned(),
            "scope" => "1".to_owned(),
            "first-child" => "count(preceding-sibling::*) = 0".to_owned(),
            "last-child" => "count(following-sibling::*) = 0".to_owned(),
            "first-of-type" => {
                require_element(&xpath, "*:first-of-type")?;
                format!("count(preceding-sibling::{}) = 0", xpath.element)
            }
            "last-of-type" => {
                require_element(&xpath, "*:last-of-type")?;
                format!("count(following-sibling::{}) = 0", xpath.element)
            }
            "only-child" => "count(parent::*/child::*) = 1".to_owned(),
            "only-of-type" => {
                require_element(&xpath, "*:only-of-type")?;
                format!("count(parent::*/child::{}) = 1", xpath.element)
            }
            "empty" => "not(*) and not(string-length())".to_owned(),
            "checked" if self.html => "(@selected and name(.) = 'option') or \
                (@checked and (name(.) = 'input' or name(.) = 'command') \
                and (@type = 'checkbox' or @type = 'radio'))"
                .to_owned(),
            "link" if self.html => {
                "@href and (name(.) = 'a' or name(.) = 'link' or name(.) = 'area')".to_owned()
            }
            "disabled" if self.html => "(@disabled and ((name(.) = 'input' and @type != 'hidden') \
                or name(.) = 'button' or name(.) = 'select' or name(.) = 'textarea' \
                or name(.) = 'command' or name(.) = 'fieldset' or name(.) = 'optgroup' \
                or name(.) = 'option')) or (((name(.) = 'input' and @type != 'hidden') \
                or name(.) = 'button' or name(.) = 'select' or name(.) = 'textarea') \
                and ancestor::fieldset[@disabled])"
                .to_owned(),
            "enabled" if self.html => "(@href and (name(.) = 'a' or name(.) = 'link' \
                or name(.) = 'area')) or ((name(.) = 'command' or name(.) = 'fieldset' \
                or name(.) = 'optgroup') and not(@disabled)) or (((name(.) = 'input' \
                and @type != 'hidden') or name(.) = 'button' or name(.) = 'select' \
                or name(.) = 'textarea' or name(.) = 'keygen') and not(@disabled \
                or ancestor::fieldset[@disabled])) or (name(.) = 'option' \
                and not(@disabled or ancestor::optgroup[@disabled]))"
                .to_owned(),
            // Dynamic and UI states never match a static document.
            "link" | "visited" | "hover" | "active" | "focus" | "target" | "enabled"
            | "disabled" | "checked" => "0".to_owned(),
            _ => {
                return Err(CssError::Expression(format!(
                    "The pseudo-class :{ident} is unknown"
                )))
            }
        };
        Ok(xpath.and(&condition))
    }
}

fn require_element(xpath: &XPathExpr, what: &str) -> Result<(), CssError> {
    if xpath.element == "*" {
        return Err(CssError::Expression(format!("{what} is not implemented")));
    }
    Ok(())
}

fn combine(left: XPathExpr, combinator: Combinator, right: XPathExpr) -> XPathExpr {
    match combinator {
        Combinator::Descendant => left.join("/descendant-or-self::*/", right, None),
        Combinator::Child => left.join("/", right, None),
        Combinator::DirectAdjacent => {
            let mut xpath = left.join("/following-sibling::", right, None);
            xpath.add_name_test();
            xpath.and("position() = 1")
        }
        Combinator::IndirectAdjacent => left.join("/following-sibling::", right, None),
    }
}

fn relate(left: XPathExpr, combinator: Combinator, right: XPathExpr) -> XPathExpr {
    match combinator {
        Combinator::Descendant => left.join("[descendant::", right, Some("]")),
        Combinator::Child => left.join("[./", right, Some("]")),
        Combinator::DirectAdjacent => left.and(&format!(
            "following-sibling::*[(name() = '{}') and (position() = 1)]",
            right.element
        )),
        Combinator::IndirectAdjacent => left.join("[following-sibling::", right, Some("]")),
    }
}

fn attrib_condition(xpath: XPathExpr, operator: AttribOp, name: &str, value: &str) -> XPathExpr {
    let literal = xpath_literal(value);
    let condition = match operator {
        AttribOp::Exists => name.to_owned(),
        AttribOp::Equals => format!("{name} = {literal}"),
        AttribOp::Different if value.is_empty() => format!("{name} != {literal}"),
        AttribOp::Different => format!("not({name}) or {name} != {literal}"),
        AttribOp::Includes if is_non_whitespace(value) => format!(
            "{name} and contains(concat(' ', normalize-space({name}), ' '), {})",
            xpath_literal(&format!(" {value} "))
        ),
        AttribOp::DashMatch => format!(
            "{name} and ({name} = {literal} or starts-with({name}, {}))",
            xpath_literal(&format!("{value}-"))
        ),
        AttribOp::PrefixMatch if !value.is_empty() => {
            format!("{name} and starts-with({name}, {literal})")
        }
        AttribOp::SuffixMatch if !value.is_empty() => format!(
            "{name} and substring({name}, string-length({name})-{}) = {literal}",
            value.chars().count() - 1
        ),
        AttribOp::SubstringMatch if !value.is_empty() => {
            format!("{name} and contains({name}, {literal})")
        }
        AttribOp::Includes
        | AttribOp::PrefixMatch
        | AttribOp::SuffixMatch
        | AttribOp::SubstringMatch => "0".to_owned(),
    };
    xpath.and(&condition)
}

/// Builds the `:nth-*()` condition for the series `an+b`.
fn nth_child(
    xpath: XPathExpr,
    arguments: &[Token],
    last: bool,
    add_name_test: bool,
) -> Result<XPathExpr, CssError> {
    let invalid =
        || CssError::Expression(format!("Invalid series: '{}'", format_arguments(arguments)));
    let (a, b) = parse_series(arguments).ok_or_else(invalid)?;
    let b_min_1 = b.checked_sub(1).ok_or_else(invalid)?;
    let a_abs = a.checked_abs().ok_or_else(invalid)?;

    // an+b-1 siblings exist for some n >= 0.
    if a == 1 && b_min_1 <= 0 {
        return Ok(xpath);
    }
    if a < 0 && b_min_1 < 0 {
        return Ok(xpath.and("0"));
    }

    let nodetest = if add_name_test { "*" } else { xpath.element.as_str() };
    let axis = if last { "following-sibling" } else { "preceding-sibling" };
    let siblings = format!("count({axis}::{nodetest})");

    if a == 0 {
        return Ok(xpath.and(&format!("{siblings} = {b_min_1}")));
    }

    let mut expressions = Vec::new();
    if a > 0 {
        if b_min_1 > 0 {
            expressions.push(format!("{siblings} >= {b_min_1}"));
        }
    } else {
        expressions.push(format!("{siblings} <= {b_min_1}"));
    }
    if a_abs != 1 {
        let b_neg = b_min_1.checked_neg().ok_or_else(invalid)?.rem_euclid(a_abs);
        let left = if b_neg == 0 {
            siblings
        } else {
            format!("({siblings} +{b_neg})")
        };
        expressions.push(format!("{left} mod {a} = 0"));
    }

    let condition = if expressions.len() > 1 {
        expressions
            .iter()
            .map(|e| format!("({e})"))
            .collect::<Vec<_>>()
            .join(" and ")
    } else {
        expressions.join(" and ")
    };
    Ok(xpath.and(&condition))
}

/// Translator used for HTML and TEXT selections.
pub static HTML_TRANSLATOR: Lazy<Translator> = Lazy::new(Translator::html);

/// Translator used for XML selections.
pub static GENERIC_TRANSLATOR: Lazy<Translator> = Lazy::new(Translator::generic);

/// Translates a selector with the shared HTML translator.
///
/// # Errors
///
/// See [`Translator::css_to_xpath`].
///
/// # Examples
///
/// ```
/// use seloxide::css::css2xpath;
///
/// assert_eq!(
///     css2xpath(".some-class").unwrap(),
///     "descendant-or-self::*[@class and contains(concat(' ', \
///      normalize-space(@class), ' '), ' some-class ')]"
/// );
/// ```
pub fn css2xpath(query: &str) -> Result<String, CssError> {
    HTML_TRANSLATOR.css_to_xpath(query)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn generic(css: &str) -> String {
        Translator::generic().css_to_xpath_with_prefix(css, "").unwrap()
    }

    fn html(css: &str) -> String {
        Translator::html().css_to_xpath_with_prefix(css, "").unwrap()
    }

    #[test]
    fn test_basic_selectors() {
        assert_eq!(generic("e"), "e");
        assert_eq!(generic("*"), "*");
        assert_eq!(generic("e f"), "e/descendant-or-self::*/f");
        assert_eq!(generic("e > f"), "e/f");
        assert_eq!(generic("e ~ f"), "e/following-sibling::f");
        assert_eq!(
            generic("e + f"),
            "e/following-sibling::*[(name() = 'f') and (position() = 1)]"
        );
        assert_eq!(generic("e#myid"), "e[@id = 'myid']");
        assert_eq!(generic("ns|e"), "ns:e");
    }

    #[test]
    fn test_attribute_operators() {
        assert_eq!(generic("e[foo]"), "e[@foo]");
        assert_eq!(generic("e[foo='bar']"), "e[@foo = 'bar']");
        assert_eq!(
            generic("e[foo~='bar']"),
            "e[@foo and contains(concat(' ', normalize-space(@foo), ' '), ' bar ')]"
        );
        assert_eq!(generic("e[foo~='']"), "e[0]");
        assert_eq!(
            generic("e[foo|='en']"),
            "e[@foo and (@foo = 'en' or starts-with(@foo, 'en-'))]"
        );
        assert_eq!(generic("e[foo^='b']"), "e[@foo and starts-with(@foo, 'b')]");
        assert_eq!(
            generic("e[foo$='bar']"),
            "e[@foo and substring(@foo, string-length(@foo)-2) = 'bar']"
        );
        assert_eq!(generic("e[foo*='x']"), "e[@foo and contains(@foo, 'x')]");
        assert_eq!(generic("e[foo!='x']"), "e[not(@foo) or @foo != 'x']");
        assert_eq!(
            generic("e[foo\\:bar]"),
            "e[attribute::*[name() = 'foo:bar']]"
        );
    }

    #[test]
    fn test_structural_pseudo_classes() {
        assert_eq!(generic("e:first-child"), "e[count(preceding-sibling::*) = 0]");
        assert_eq!(generic("e:nth-child(1)"), "e[count(preceding-sibling::*) = 0]");
        assert_eq!(generic("e:nth-child(n)"), "e");
        assert_eq!(
            generic("e:nth-child(3n+1)"),
            "e[count(preceding-sibling::*) mod 3 = 0]"
        );
        assert_eq!(
            generic("e:nth-child(2n+5)"),
            "e[(count(preceding-sibling::*) >= 4) and (count(preceding-sibling::*) mod 2 = 0)]"
        );
        assert_eq!(
            generic("e:nth-child(3n+2)"),
            "e[(count(preceding-sibling::*) >= 1) and ((count(preceding-sibling::*) +2) mod 3 = 0)]"
        );
        assert_eq!(generic("e:nth-child(-n+3)"), "e[count(preceding-sibling::*) <= 2]");
        assert_eq!(generic("e:nth-child(-n-1)"), "e[0]");
        assert_eq!(
            generic("e:nth-last-of-type(2)"),
            "e[count(following-sibling::e) = 1]"
        );
        assert_eq!(generic("e:empty"), "e[not(*) and not(string-length())]");
        assert_eq!(generic("e:root"), "e[not(parent::*)]");
        assert_eq!(generic("e:only-of-type"), "e[count(parent::*/child::e) = 1]");
    }

    #[test]
    fn test_negation_and_matching() {
        assert_eq!(generic("e:not(f)"), "e[not(name() = 'f')]");
        assert_eq!(generic("e:not(*)"), "e[0]");
        assert_eq!(
            generic("e:not(:nth-child(odd))"),
            "e[not(count(preceding-sibling::*) mod 2 = 0)]"
        );
        assert_eq!(generic("*:is(a, b)"), "*[(name() = 'a') or (name() = 'b')]");
        assert_eq!(generic("e:where(.x)"), "e[@class and contains(concat(' ', normalize-space(@class), ' '), ' x ')]");
    }

    #[test]
    fn test_has_relation() {
        assert_eq!(generic("e:has(f)"), "e[descendant::f]");
        assert_eq!(generic("e:has(> f)"), "e[./f]");
        assert_eq!(generic("e:has(~ f)"), "e[following-sibling::f]");
        assert_eq!(
            generic("e:has(+ f)"),
            "e[following-sibling::*[(name() = 'f') and (position() = 1)]]"
        );
    }

    #[test]
    fn test_html_flavor_lowercases_names() {
        assert_eq!(html("DIV[ID]"), "div[@id]");
        assert_eq!(generic("DIV[ID]"), "DIV[@ID]");
        assert_eq!(
            html("a:link"),
            "a[@href and (name(.) = 'a' or name(.) = 'link' or name(.) = 'area')]"
        );
        assert_eq!(generic("a:link"), "a[0]");
        assert_eq!(generic("e:lang(en)"), "e[lang('en')]");
        assert!(html("e:lang(EN)").contains("'en-'"));
    }

    #[test]
    fn test_pseudo_element_rewrites() {
        assert_eq!(generic("::text"), "text()");
        assert_eq!(generic("p ::text"), "p/descendant-or-self::text()");
        assert_eq!(generic("p > ::text"), "p/*/text()");
        assert_eq!(generic("::attr(name)"), "*/@name");
        assert_eq!(generic("a ::attr(img)"), "a/descendant-or-self::*/@img");
        assert_eq!(generic("a::attr('data-x')"), "a/@data-x");
    }

    #[test]
    fn test_expression_errors() {
        let tr = Translator::generic();
        for css in [
            "::attr(12)",
            "::attr(34test)",
            "::text()",
            "::attribute(12)",
            "::text-node",
            ":text",
            ":attribute(name)",
            "*:first-of-type",
            "e:nth-child(foo)",
            "e:contains(a b)",
        ] {
            assert!(
                matches!(tr.css_to_xpath(css), Err(CssError::Expression(_))),
                "{css:?} should be an expression error"
            );
        }
    }

    #[test]
    fn test_nth_series_overflow_is_an_error() {
        let tr = Translator::generic();
        for css in [
            "e:nth-child(-9223372036854775808)",
            "e:nth-child(-9223372036854775808n+3)",
            "e:nth-child(2n-9223372036854775807)",
        ] {
            match tr.css_to_xpath(css) {
                Err(CssError::Expression(message)) => {
                    assert!(message.starts_with("Invalid series"), "{message}");
                }
                other => panic!("{css:?} gave {other:?}"),
            }
        }
        assert_eq!(
            generic("e:nth-child(9223372036854775807)"),
            "e[count(preceding-sibling::*) = 9223372036854775806]"
        );
    }

    #[test]
    fn test_cache_hits_return_same_translation() {
        let tr = Translator::html();
        let first = tr.css_to_xpath("li::text").unwrap();
        let second = tr.css_to_xpath("li::text").unwrap();
        assert_eq!(first, second);
        assert_eq!(tr.cache.lock().len(), 1);
        assert_ne!(
            tr.css_to_xpath_with_prefix("li::text", "").unwrap(),
            first
        );
        assert_eq!(tr.cache.lock().len(), 2);
    }

    #[test]
    fn test_xpath_literal_mixed_quotes() {
        assert_eq!(xpath_literal(r#"a'b"c"#), r#"concat('a',"'",'b"c')"#);
    }
}
