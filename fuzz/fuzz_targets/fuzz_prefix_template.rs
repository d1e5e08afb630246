//! Fuzz target for file prefix template rendering.
//!
//! Tests that arbitrary templates against an arbitrary start document either
//! render to a plain file name or fail with an error.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sc_event_model::Document;
use sc_json_metadata::template::render_prefix;

#[derive(Arbitrary, Debug)]
struct Input {
    template: String,
    start_json: String,
    time: f64,
}

fuzz_target!(|input: Input| {
    let mut start = serde_json::from_str::<serde_json::Value>(&input.start_json)
        .ok()
        .and_then(|v| Document::try_from(v).ok())
        .unwrap_or_default();
    start.insert("time", input.time);
    start.insert("uid", "fuzz-run");

    if let Ok(prefix) = render_prefix(&input.template, &start) {
        assert!(!prefix.contains('/'));
        assert!(!prefix.contains('\\'));
    }
});
