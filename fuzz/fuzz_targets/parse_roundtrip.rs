#![no_main]

use libfuzzer_sys::fuzz_target;
use tagtree::{ClosePolicy, Document, OutputOptions, ParseOptions};

const MAX_INPUT_BYTES: usize = 64 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_BYTES {
        return;
    }
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let policy = if data.len() % 2 == 0 {
        ClosePolicy::ForceClose
    } else {
        ClosePolicy::Cascade
    };
    let options = ParseOptions::default()
        .with_max_depth(256)
        .with_close_policy(policy);
    let Ok(mut doc) = Document::parse_with(input, options.clone()) else {
        return;
    };
    let html = doc.to_html().expect("unchanged document serializes");
    assert_eq!(html, input, "unchanged document must round-trip");

    doc.set_output_options(OutputOptions {
        original_case: true,
        ..OutputOptions::default()
    });
    let regenerated = doc.to_html().expect("regenerate");
    if let Ok(again) = Document::parse_with(&regenerated, options) {
        let _ = again.to_html();
    }

    doc.set_output_options(OutputOptions::xml());
    let _ = doc.to_html();
});
