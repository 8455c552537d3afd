//! CSS to `XPath` translation and CSS queries against a small page.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use rstest::rstest;

use seloxide::css::{css2xpath, CssError, Translator};
use seloxide::{Selection, SelectionBuilder};

const HTMLBODY: &str = r#"
<html>
<body>
<div>
 <a id="name-anchor" name="foo"></a>
 <a id="tag-anchor" rel="tag" href="http://localhost/foo">link</a>
 <a id="nofollow-anchor" rel="nofollow" href="https://example.org"> link</a>
 <p id="paragraph">
   lorem ipsum text
   <b id="p-b">hi</b> <em id="p-em">there</em>
   <b id="p-b2">guy</b>
   <input type="checkbox" id="checkbox-unchecked" />
   <input type="checkbox" id="checkbox-disabled" disabled="" />
   <input type="text" id="text-checked" checked="checked" />
   <input type="hidden" />
   <input type="hidden" disabled="disabled" />
   <input type="checkbox" id="checkbox-checked" checked="checked" />
   <input type="checkbox" id="checkbox-disabled-checked"
          disabled="disabled" checked="checked" />
 </p>
 <map name="dummymap">
   <area shape="circle" coords="200,250,25" href="foo.html" id="area-href" />
   <area shape="default" id="area-nohref" />
 </map>
</div>
<div class="cool-footer" id="foobar-div" foobar="ab bc cde">
    <span id="foobar-span">foo ter</span>
</div>
</body></html>
"#;

fn translators() -> [Translator; 2] {
    [Translator::html(), Translator::generic()]
}

#[rstest]
#[case("::attr(name)", "descendant-or-self::*/@name")]
#[case("a::attr(href)", "descendant-or-self::a/@href")]
#[case("a ::attr(img)", "descendant-or-self::a/descendant-or-self::*/@img")]
#[case("a > ::attr(class)", "descendant-or-self::a/*/@class")]
fn test_attr_function(#[case] css: &str, #[case] xpath: &str) {
    for tr in translators() {
        assert_eq!(tr.css_to_xpath(css).unwrap(), xpath, "{css}");
    }
}

#[rstest]
#[case("::text", "descendant-or-self::text()")]
#[case("p::text", "descendant-or-self::p/text()")]
#[case("p ::text", "descendant-or-self::p/descendant-or-self::text()")]
#[case("#id::text", "descendant-or-self::*[@id = 'id']/text()")]
#[case("p#id::text", "descendant-or-self::p[@id = 'id']/text()")]
#[case("p#id ::text", "descendant-or-self::p[@id = 'id']/descendant-or-self::text()")]
#[case("p#id > ::text", "descendant-or-self::p[@id = 'id']/*/text()")]
#[case("p#id ~ ::text", "descendant-or-self::p[@id = 'id']/following-sibling::*/text()")]
#[case("a[href]::text", "descendant-or-self::a[@href]/text()")]
#[case("a[href] ::text", "descendant-or-self::a[@href]/descendant-or-self::text()")]
#[case("p::text, a::text", "descendant-or-self::p/text() | descendant-or-self::a/text()")]
fn test_text_pseudo_element(#[case] css: &str, #[case] xpath: &str) {
    for tr in translators() {
        assert_eq!(tr.css_to_xpath(css).unwrap(), xpath, "{css}");
    }
}

#[rstest]
#[case("::attr(12)", false)]
#[case("::attr(34test)", false)]
#[case("::attr(@href)", true)]
#[case("::attribute(12)", false)]
#[case("::text()", false)]
#[case("::text-node", false)]
#[case(":text", false)]
#[case(":attribute(name)", false)]
fn test_translation_errors(#[case] css: &str, #[case] syntax: bool) {
    for tr in translators() {
        let err = tr.css_to_xpath(css).unwrap_err();
        assert_eq!(err.is_syntax_error(), syntax, "{css}: {err}");
        if !syntax {
            assert!(matches!(err, CssError::Expression(_)), "{css}");
        }
    }
}

#[test]
fn test_css2xpath() {
    assert_eq!(
        css2xpath(".some-class").unwrap(),
        "descendant-or-self::*[@class and contains(\
         concat(' ', normalize-space(@class), ' '), ' some-class ')]"
    );
}

fn stripped(sel: &Selection, css: &str) -> Vec<String> {
    sel.css(css)
        .unwrap()
        .getall()
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect()
}

fn selections() -> [Selection; 2] {
    [
        Selection::new(HTMLBODY),
        SelectionBuilder::new()
            .body(HTMLBODY.as_bytes())
            .build()
            .unwrap(),
    ]
}

#[test]
fn test_selector_simple() {
    for sel in selections() {
        let inputs = sel.css("input").unwrap();
        assert_eq!(inputs.len(), 7);
        let each: Vec<String> = inputs.iter().map(Selection::get).collect();
        assert_eq!(inputs.getall(), each);
    }
}

#[test]
fn test_text_pseudo_element_results() {
    for sel in selections() {
        assert_eq!(stripped(&sel, "#p-b2"), [r#"<b id="p-b2">guy</b>"#]);
        assert_eq!(stripped(&sel, "#p-b2::text"), ["guy"]);
        assert_eq!(stripped(&sel, "#p-b2 ::text"), ["guy"]);
        assert_eq!(stripped(&sel, "#paragraph::text"), ["lorem ipsum text"]);
        assert_eq!(
            stripped(&sel, "#paragraph ::text"),
            ["lorem ipsum text", "hi", "there", "guy"]
        );
        assert_eq!(stripped(&sel, "p::text"), ["lorem ipsum text"]);
        assert_eq!(
            stripped(&sel, "p ::text"),
            ["lorem ipsum text", "hi", "there", "guy"]
        );
    }
}

#[test]
fn test_attribute_function_results() {
    for sel in selections() {
        assert_eq!(stripped(&sel, "#p-b2::attr(id)"), ["p-b2"]);
        assert_eq!(stripped(&sel, ".cool-footer::attr(class)"), ["cool-footer"]);
        assert_eq!(
            stripped(&sel, ".cool-footer ::attr(id)"),
            ["foobar-div", "foobar-span"]
        );
        assert_eq!(
            stripped(&sel, r#"map[name="dummymap"] ::attr(shape)"#),
            ["circle", "default"]
        );
    }
}

#[test]
fn test_nested_selector() {
    let sel = Selection::new(HTMLBODY);
    assert_eq!(
        sel.css("p").unwrap().css("b::text").unwrap().getall(),
        ["hi", "guy"]
    );
    assert_eq!(
        sel.css("div").unwrap().css("area:last-child").unwrap().getall(),
        [r#"<area shape="default" id="area-nohref">"#]
    );
}

#[test]
fn test_pseudoclass_has() {
    let sel = Selection::new(HTMLBODY);
    assert_eq!(stripped(&sel, "p:has(b)::text"), ["lorem ipsum text"]);
    assert_eq!(stripped(&sel, "div:has(span)::attr(id)"), ["foobar-div"]);
    assert!(stripped(&sel, "p:has(span)").is_empty());
}

#[test]
fn test_attribute_operators_on_page() {
    let sel = Selection::new(HTMLBODY);
    assert_eq!(stripped(&sel, "[foobar~=bc]::attr(id)"), ["foobar-div"]);
    assert_eq!(stripped(&sel, "[foobar^=ab]::attr(id)"), ["foobar-div"]);
    assert_eq!(stripped(&sel, "[foobar$=cde]::attr(id)"), ["foobar-div"]);
    assert_eq!(stripped(&sel, "[foobar*='b b']::attr(id)"), ["foobar-div"]);
    assert!(stripped(&sel, "[foobar~=b]").is_empty());
    assert_eq!(
        stripped(&sel, "a[href^='https']::attr(id)"),
        ["nofollow-anchor"]
    );
}

#[test]
fn test_html_state_pseudo_classes() {
    let sel = Selection::new(HTMLBODY);
    assert_eq!(
        stripped(&sel, "input:checked::attr(id)"),
        ["checkbox-checked", "checkbox-disabled-checked"]
    );
    assert_eq!(
        stripped(&sel, "input:disabled::attr(id)"),
        ["checkbox-disabled", "checkbox-disabled-checked"]
    );
    assert_eq!(
        stripped(&sel, ":link::attr(id)"),
        ["tag-anchor", "nofollow-anchor", "area-href"]
    );
    assert!(stripped(&sel, "a:hover").is_empty());
}

#[test]
fn test_structural_pseudo_classes_on_page() {
    let sel = Selection::new(HTMLBODY);
    assert_eq!(stripped(&sel, "div > a:first-child::attr(id)"), ["name-anchor"]);
    assert_eq!(stripped(&sel, "b:nth-of-type(2)::text"), ["guy"]);
    assert_eq!(stripped(&sel, "a:nth-child(2n+1)::attr(id)"), ["name-anchor", "nofollow-anchor"]);
    assert_eq!(stripped(&sel, "p > em:only-of-type::text"), ["there"]);
    assert_eq!(stripped(&sel, "a:empty::attr(id)"), ["name-anchor"]);
    assert_eq!(stripped(&sel, "span:contains('foo')::text"), ["foo ter"]);
    assert_eq!(stripped(&sel, "a:not([href])::attr(id)"), ["name-anchor"]);
}
