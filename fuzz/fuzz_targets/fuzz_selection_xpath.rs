#![no_main]
use libfuzzer_sys::fuzz_target;
use seloxide::Selection;

fuzz_target!(|data: &[u8]| {
    if let Ok(expr) = std::str::from_utf8(data) {
        let sel = Selection::new(r#"<div id="a" class="x y"><p>text</p><a href="/l">l</a></div>"#);
        // Evaluation of any expression must not panic
        if let Ok(found) = sel.xpath(expr) {
            let _ = found.getall();
        }
    }
});
