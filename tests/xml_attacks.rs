//! Known XML attacks must not expand entities or read external resources.

#![allow(clippy::unwrap_used)]

use seloxide::{Kind, Selection, SelectionBuilder};

const BILLION_LAUGHS: &str = r#"<?xml version="1.0"?>
<!DOCTYPE lolz [
 <!ENTITY lol "lol">
 <!ELEMENT lolz (#PCDATA)>
 <!ENTITY lol1 "&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;">
 <!ENTITY lol2 "&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;">
 <!ENTITY lol3 "&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;">
 <!ENTITY lol4 "&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;">
 <!ENTITY lol5 "&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;">
 <!ENTITY lol6 "&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;">
 <!ENTITY lol7 "&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;">
 <!ENTITY lol8 "&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;">
 <!ENTITY lol9 "&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;">
]>
<lolz>&lol9;</lolz>
"#;

const EXTERNAL_ENTITY: &str = r#"<?xml version="1.0"?>
<!DOCTYPE foo [
 <!ENTITY xxe SYSTEM "file:///etc/passwd">
]>
<foo>&xxe;</foo>
"#;

fn xml(text: &str) -> Selection {
    SelectionBuilder::new()
        .text(text)
        .kind(Kind::Xml)
        .build()
        .unwrap()
}

#[test]
fn test_billion_laughs_html() {
    let sel = Selection::new(BILLION_LAUGHS);
    let lolz = sel.css("lolz::text").unwrap().get();
    assert_eq!(lolz.as_deref(), Some("&lol9;"));
}

#[test]
fn test_billion_laughs_xml() {
    let sel = xml(BILLION_LAUGHS);
    assert_eq!(sel.xpath("string(//lolz)").unwrap().get().as_deref(), Some("&lol9;"));
    assert_eq!(sel.get(), "<lolz>&lol9;</lolz>");
}

#[test]
fn test_external_entity_not_resolved() {
    let sel = xml(EXTERNAL_ENTITY);
    assert_eq!(sel.xpath("string(/foo)").unwrap().get().as_deref(), Some("&xxe;"));
    let html = Selection::new(EXTERNAL_ENTITY);
    assert_eq!(html.css("foo::text").unwrap().get().as_deref(), Some("&xxe;"));
}

#[test]
fn test_quadratic_blowup_stays_linear() {
    let name = "a".repeat(1000);
    let text = format!(
        "<?xml version=\"1.0\"?><!DOCTYPE r [<!ENTITY {name} \"{}\">]><r>{}</r>",
        "x".repeat(1000),
        format!("&{name};").repeat(100)
    );
    let sel = xml(&text);
    let content = sel.xpath("string(/r)").unwrap().get().unwrap();
    assert_eq!(content.len(), (name.len() + 2) * 100);
}
