#![no_main]
use libfuzzer_sys::fuzz_target;
use seloxide::css::Translator;

fuzz_target!(|data: &[u8]| {
    if let Ok(css) = std::str::from_utf8(data) {
        // Translation must return an error, never panic
        let _ = Translator::html().css_to_xpath(css);
        let _ = Translator::generic().css_to_xpath(css);
    }
});
