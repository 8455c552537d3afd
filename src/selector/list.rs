//! Ordered lists of selections.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, RangeBounds};

use regex::Regex;

use super::{Selection, XPathOptions};
use crate::error::Result;
use crate::util::{flatten, Nested};

/// The result of a query: selections in match order.
///
/// Query methods run on every element and concatenate the results, first
/// element first. The element type is generic so that wrappers around
/// [`Selection`] get lists of themselves back.
///
/// ```
/// use seloxide::Selection;
///
/// let sel = Selection::new("<ul><li><a>1</a></li><li><a>2</a><a>3</a></li></ul>");
/// let items = sel.css("li").unwrap();
/// assert_eq!(items.css("a::text").unwrap().getall(), ["1", "2", "3"]);
/// assert_eq!(items.slice(1..).len(), 1);
/// ```
pub struct SelectionList<S = Selection> {
    items: Vec<S>,
}

impl<S> SelectionList<S> {
    /// Wraps a vector of selections.
    #[must_use]
    pub fn new(items: Vec<S>) -> Self {
        Self { items }
    }

    /// Returns the number of selections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the list holds no selection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the first selection.
    #[must_use]
    pub fn first(&self) -> Option<&S> {
        self.items.first()
    }

    /// Returns the selection at `index`.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&S> {
        self.items.get(index)
    }

    /// Iterates over the selections.
    pub fn iter(&self) -> std::slice::Iter<'_, S> {
        self.items.iter()
    }

    /// Returns the selections as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[S] {
        &self.items
    }

    /// Unwraps the list.
    #[must_use]
    pub fn into_vec(self) -> Vec<S> {
        self.items
    }
}

impl<S: Clone> SelectionList<S> {
    /// Returns a sub-list, keeping the list type.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds, like slice indexing.
    #[must_use]
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let range = (range.start_bound().cloned(), range.end_bound().cloned());
        Self::new(self.items[range].to_vec())
    }
}

impl<S> SelectionList<S>
where
    S: AsRef<Selection> + From<Selection>,
{
    fn fan_out<F>(&self, query: F) -> Result<Self>
    where
        F: Fn(&Selection) -> Result<SelectionList>,
    {
        let mut items = Vec::new();
        for item in &self.items {
            items.extend(query(item.as_ref())?.items.into_iter().map(S::from));
        }
        Ok(Self::new(items))
    }

    /// Runs [`Selection::xpath`] on every element.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an element.
    pub fn xpath(&self, query: &str) -> Result<Self> {
        self.fan_out(|sel| sel.xpath(query))
    }

    /// Runs [`Selection::xpath_with`] on every element.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an element.
    pub fn xpath_with(&self, query: &str, options: &XPathOptions) -> Result<Self> {
        self.fan_out(|sel| sel.xpath_with(query, options))
    }

    /// Runs [`Selection::css`] on every element.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an element.
    pub fn css(&self, query: &str) -> Result<Self> {
        self.fan_out(|sel| sel.css(query))
    }

    /// Runs [`Selection::jmespath`] on every element.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an element.
    pub fn jmespath(&self, query: &str) -> Result<Self> {
        self.fan_out(|sel| sel.jmespath(query))
    }

    /// Runs [`Selection::jmespath_with`] on every element.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an element.
    pub fn jmespath_with(&self, query: &str, runtime: &jmespath::Runtime) -> Result<Self> {
        self.fan_out(|sel| sel.jmespath_with(query, runtime))
    }

    /// Applies `regex` to every element and concatenates the matches.
    #[must_use]
    pub fn re(&self, regex: &Regex, replace_entities: bool) -> Vec<String> {
        let nested: Vec<Nested<String>> = self
            .items
            .iter()
            .map(|item| Nested::from(item.as_ref().re(regex, replace_entities)))
            .collect();
        flatten(&nested)
    }

    /// Returns the first regex match over the elements, in order.
    #[must_use]
    pub fn re_first(&self, regex: &Regex, replace_entities: bool) -> Option<String> {
        self.items
            .iter()
            .find_map(|item| item.as_ref().re_first(regex, replace_entities))
    }

    /// Serializes the first element.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.items.first().map(|item| item.as_ref().get())
    }

    /// Serializes every element.
    #[must_use]
    pub fn getall(&self) -> Vec<String> {
        self.items.iter().map(|item| item.as_ref().get()).collect()
    }

    /// Alias of [`get`](Self::get).
    #[must_use]
    pub fn extract_first(&self) -> Option<String> {
        self.get()
    }

    /// Alias of [`getall`](Self::getall).
    #[must_use]
    pub fn extract_all(&self) -> Vec<String> {
        self.getall()
    }

    /// Returns the attributes of the first element, or an empty map.
    #[must_use]
    pub fn attrib(&self) -> BTreeMap<String, String> {
        self.items
            .first()
            .map(|item| item.as_ref().attrib())
            .unwrap_or_default()
    }

    /// Drops every element from its tree, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first element that cannot be dropped and returns its
    /// error. Elements before it stay dropped.
    pub fn drop(&self) -> Result<()> {
        for item in &self.items {
            item.as_ref().drop()?;
        }
        Ok(())
    }
}

impl<S> Default for SelectionList<S> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<S: Clone> Clone for SelectionList<S> {
    fn clone(&self) -> Self {
        Self::new(self.items.clone())
    }
}

impl<S: fmt::Debug> fmt::Debug for SelectionList<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl<S> Index<usize> for SelectionList<S> {
    type Output = S;

    fn index(&self, index: usize) -> &S {
        &self.items[index]
    }
}

impl<S> From<Vec<S>> for SelectionList<S> {
    fn from(items: Vec<S>) -> Self {
        Self::new(items)
    }
}

impl<S> FromIterator<S> for SelectionList<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<S> IntoIterator for SelectionList<S> {
    type Item = S;
    type IntoIter = std::vec::IntoIter<S>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, S> IntoIterator for &'a SelectionList<S> {
    type Item = &'a S;
    type IntoIter = std::slice::Iter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// A wrapper type standing in for a user extension of `Selection`.
    #[derive(Debug, Clone)]
    struct Tagged(Selection);

    impl From<Selection> for Tagged {
        fn from(sel: Selection) -> Self {
            Self(sel)
        }
    }

    impl AsRef<Selection> for Tagged {
        fn as_ref(&self) -> &Selection {
            &self.0
        }
    }

    fn list() -> SelectionList {
        Selection::new("<ul><li>a<b>1</b></li><li>b<b>2</b><b>3</b></li></ul>")
            .css("li")
            .unwrap()
    }

    #[test]
    fn test_fan_out_keeps_element_order() {
        let items = list();
        let per_item: Vec<String> = items
            .iter()
            .flat_map(|li| li.xpath("b/text()").unwrap().getall())
            .collect();
        assert_eq!(items.xpath("b/text()").unwrap().getall(), per_item);
        assert_eq!(per_item, ["1", "2", "3"]);
    }

    #[test]
    fn test_empty_list_accessors() {
        let empty: SelectionList = SelectionList::default();
        assert_eq!(empty.get(), None);
        assert!(empty.getall().is_empty());
        assert!(empty.attrib().is_empty());
        assert!(empty.css("a").unwrap().is_empty());
        assert_eq!(empty.get().unwrap_or_else(|| "dflt".to_owned()), "dflt");
    }

    #[test]
    fn test_aliases_match_accessors() {
        let items = list();
        assert_eq!(items.extract_first(), items.get());
        assert_eq!(items.extract_all(), items.getall());
        assert_eq!(items[0].extract_all(), vec![items[0].extract()]);
        let owned = items.clone().into_vec();
        assert_eq!(owned.len(), items.len());
    }

    #[test]
    fn test_slice_and_index() {
        let items = list();
        assert_eq!(items.slice(..1).len(), 1);
        assert_eq!(items.slice(1..).getall(), vec![items[1].get()]);
        assert!(items.item(5).is_none());
    }

    #[test]
    fn test_re_flattens_in_order() {
        let items = list();
        let digits = Regex::new(r"\d").unwrap();
        assert_eq!(items.re(&digits, true), ["1", "2", "3"]);
        assert_eq!(items.re_first(&digits, true).as_deref(), Some("1"));
        let none = Regex::new("zzz").unwrap();
        assert_eq!(items.re_first(&none, true), None);
    }

    #[test]
    fn test_custom_element_type() {
        let tagged: SelectionList<Tagged> = list().into_iter().map(Tagged::from).collect();
        let bold: SelectionList<Tagged> = tagged.css("b::text").unwrap();
        assert_eq!(bold.len(), 3);
        assert_eq!(bold[2].0.get(), "3");
    }

    #[test]
    fn test_drop_stops_at_first_failure() {
        let sel = Selection::new("<ul><li>1</li><li>2</li></ul>");
        let mixed: SelectionList = sel
            .css("li")
            .unwrap()
            .slice(..1)
            .into_iter()
            .chain(sel.css("li::text").unwrap())
            .chain(sel.css("li").unwrap().slice(1..))
            .collect();
        assert!(matches!(mixed.drop(), Err(Error::CannotDropWithoutRoot)));
        assert_eq!(sel.css("li::text").unwrap().getall(), ["2"]);
    }

    #[test]
    fn test_drop_all() {
        let sel = Selection::new("<ul><li>1</li><li>2</li><p>3</p></ul>");
        sel.css("li").unwrap().drop().unwrap();
        assert!(sel.css("li").unwrap().is_empty());
        assert_eq!(sel.css("p::text").unwrap().getall(), ["3"]);
    }
}
