//! Regular expression extraction over serialized selections.

use regex::Regex;

use super::entities::{replace_entities, KEEP_DEFAULT};
use super::{flatten, Nested};

/// Extracts strings from `text` with `regex`.
///
/// - If the pattern has a group named `extract`, the result holds that
///   group's text from the first match, or nothing when there is no match
///   or the group did not take part in it.
/// - Otherwise every match contributes its capture groups in order
///   (unmatched groups as empty strings), or the whole match when the
///   pattern has no groups.
///
/// With `decode_entities`, each string goes through
/// [`replace_entities`], which keeps `&amp;` and `&lt;` as written.
///
/// # Examples
///
/// ```
/// use regex::Regex;
/// use seloxide::util::extract_regex;
///
/// let re = Regex::new(r"(\w+)=(\d+)").unwrap();
/// assert_eq!(extract_regex(&re, "a=1 b=2", true), ["a", "1", "b", "2"]);
///
/// let named = Regex::new(r"(?P<extract>foo)|(?P<bar>baz)").unwrap();
/// assert!(extract_regex(&named, "baz", true).is_empty());
/// ```
#[must_use]
pub fn extract_regex(regex: &Regex, text: &str, decode_entities: bool) -> Vec<String> {
    let strings = if regex.capture_names().any(|name| name == Some("extract")) {
        regex
            .captures(text)
            .and_then(|caps| caps.name("extract"))
            .map(|m| vec![m.as_str().to_owned()])
            .unwrap_or_default()
    } else {
        let matches: Vec<Nested<String>> = regex
            .captures_iter(text)
            .map(|caps| {
                if caps.len() == 1 {
                    Nested::Leaf(caps[0].to_owned())
                } else {
                    Nested::Seq(
                        caps.iter()
                            .skip(1)
                            .map(|m| Nested::Leaf(m.map_or(String::new(), |m| m.as_str().to_owned())))
                            .collect(),
                    )
                }
            })
            .collect();
        flatten(&matches)
    };

    if !decode_entities {
        return strings;
    }
    strings
        .iter()
        .map(|s| replace_entities(s, KEEP_DEFAULT))
        .collect()
}
