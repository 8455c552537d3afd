//! Text utilities shared by selections and the command line.
//!
//! Contains nested-sequence flattening, regular expression extraction and
//! HTML entity decoding.

pub mod entities;
pub mod regex;

pub use self::regex::extract_regex;

/// A value that is either a single item or a sequence of nested values.
///
/// Strings are leaves: a `Nested<String>` never splits a string into
/// characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested<T> {
    /// A single item.
    Leaf(T),
    /// A nested sequence.
    Seq(Vec<Nested<T>>),
}

impl<T> From<Vec<T>> for Nested<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Seq(items.into_iter().map(Self::Leaf).collect())
    }
}

/// Flattens nested sequences into one list, depth first.
///
/// # Examples
///
/// ```
/// use seloxide::util::{flatten, Nested};
///
/// let nested = vec![
///     Nested::Leaf(1),
///     Nested::Seq(vec![Nested::Leaf(2), Nested::from(vec![3, 4])]),
/// ];
/// assert_eq!(flatten(&nested), [1, 2, 3, 4]);
/// ```
#[must_use]
pub fn flatten<T: Clone>(items: &[Nested<T>]) -> Vec<T> {
    iflatten(items).cloned().collect()
}

/// Lazily flattens nested sequences.
///
/// Each call starts a fresh walk over the borrowed input, so the result
/// can be produced any number of times.
pub fn iflatten<T>(items: &[Nested<T>]) -> IFlatten<'_, T> {
    IFlatten {
        stack: vec![items.iter()],
    }
}

/// Iterator returned by [`iflatten`].
#[derive(Debug, Clone)]
pub struct IFlatten<'a, T> {
    stack: Vec<std::slice::Iter<'a, Nested<T>>>,
}

impl<'a, T> Iterator for IFlatten<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Nested::Leaf(item)) => return Some(item),
                Some(Nested::Seq(inner)) => self.stack.push(inner.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
