//! Regex extraction and flattening helpers.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use regex::Regex;
use rstest::rstest;

use seloxide::util::entities::replace_entities;
use seloxide::{extract_regex, flatten, iflatten, Nested};

#[rstest]
#[case(
    r"(?P<month>\w+)\s*(?P<day>\d+)\s*,?\s*(?P<year>\d+)",
    "October  25, 2019",
    true,
    &["October", "25", "2019"],
)]
#[case(
    r"(?P<month>\w+)\s*(?P<day>\d+)\s*,?\s*(?P<year>\d+)",
    "October  25 2019",
    true,
    &["October", "25", "2019"],
)]
#[case(
    r"(?P<extract>\w+)\s*(?P<day>\d+)\s*,?\s*(?P<year>\d+)",
    "October  25 2019",
    true,
    &["October"],
)]
#[case(r"\w+\s*\d+\s*,?\s*\d+", "October  25 2019", true, &["October  25 2019"])]
#[case(
    r"^.*$",
    "&quot;sometext&quot; &amp; &quot;moretext&quot;",
    true,
    &[r#""sometext" &amp; "moretext""#],
)]
#[case(
    r"^.*$",
    "&quot;sometext&quot; &amp; &quot;moretext&quot;",
    false,
    &["&quot;sometext&quot; &amp; &quot;moretext&quot;"],
)]
#[case(r"(?P<extract>\d+)", "no digits here", true, &[])]
#[case(r"(a)|(b)", "ab", true, &["a", "", "", "b"])]
fn test_extract_regex(
    #[case] pattern: &str,
    #[case] text: &str,
    #[case] replace: bool,
    #[case] expected: &[&str],
) {
    let regex = Regex::new(pattern).unwrap();
    assert_eq!(extract_regex(&regex, text, replace), expected);
}

#[test]
fn test_extract_group_only_uses_first_match() {
    let regex = Regex::new(r"(?P<extract>\d+)").unwrap();
    assert_eq!(extract_regex(&regex, "1 2 3", true), ["1"]);
}

#[rstest]
#[case("&lt;b&gt; &#65;&#x42;", &["lt"], "&lt;b> AB")]
#[case("&eacute;t&eacute;", &[], "été")]
#[case("&nosuch; x &amp", &[], " x &")]
#[case("&AMP; &amp;", &["amp"], "&AMP; &amp;")]
fn test_replace_entities(#[case] text: &str, #[case] keep: &[&str], #[case] expected: &str) {
    assert_eq!(replace_entities(text, keep), expected);
}

#[test]
fn test_flatten_nested_lists() {
    let nested = vec![
        Nested::Leaf("a".to_owned()),
        Nested::Seq(vec![]),
        Nested::Seq(vec![
            Nested::from(vec!["b".to_owned(), "c".to_owned()]),
            Nested::Leaf("d".to_owned()),
        ]),
    ];
    assert_eq!(flatten(&nested), ["a", "b", "c", "d"]);
    let lazy: Vec<&String> = iflatten(&nested).collect();
    assert_eq!(lazy.len(), 4);
    assert_eq!(iflatten(&nested).count(), 4);
}
