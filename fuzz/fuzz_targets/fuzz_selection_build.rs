#![no_main]
use libfuzzer_sys::fuzz_target;
use seloxide::{Kind, SelectionBuilder};

fuzz_target!(|data: &[u8]| {
    for kind in [Kind::Html, Kind::Xml, Kind::Json] {
        if let Ok(sel) = SelectionBuilder::new().body(data).kind(kind).size_guard(true).build() {
            let _ = sel.get();
            if kind != Kind::Json {
                let _ = sel.css("*::text").map(|found| found.getall());
            }
        }
    }
});
