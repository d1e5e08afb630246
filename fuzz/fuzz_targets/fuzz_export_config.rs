//! Fuzz target for export configuration parsing.
//!
//! Tests that JSON configuration parsing handles arbitrary input without
//! panicking, and that accepted configs can encode a record.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sc_json_metadata::ExportConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = ExportConfig::from_json_str(text) {
        let _ = config.encode(&serde_json::json!({"metadata": {"start": {"uid": "u"}}}));
    }
});
