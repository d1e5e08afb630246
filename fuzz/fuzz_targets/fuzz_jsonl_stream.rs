//! Fuzz target for JSON-lines document stream parsing.
//!
//! Streams are read from files produced elsewhere; parsing must return
//! errors, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sc_event_model::jsonl;

fuzz_target!(|data: &[u8]| {
    for item in jsonl::read_stream(data) {
        if let Ok((_, doc)) = item {
            let _ = doc.sanitize();
        }
    }
});
