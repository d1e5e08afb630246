//! The metadata record written to `<prefix>-meta.json`.
//!
//! ```json
//! {
//!   "suitcase_version": "0.1.0",
//!   "metadata": {
//!     "start": { "uid": "...", ... },
//!     "stop": { "exit_status": "success", ... },
//!     "descriptors": { "primary": { "<descriptor uid>": { ... } } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Version stamped into every record.
pub const SUITCASE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Descriptors grouped by stream name, then keyed by descriptor uid.
pub type DescriptorMap = BTreeMap<String, BTreeMap<String, Map<String, Value>>>;

/// Top-level record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Version of the exporter that wrote the record.
    pub suitcase_version: String,

    pub metadata: RunMetadata,
}

/// Sanitized documents of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub start: Map<String, Value>,

    /// Absent when the stream ended without a stop document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Map<String, Value>>,

    #[serde(default)]
    pub descriptors: DescriptorMap,
}

impl MetadataRecord {
    /// Create a record from a sanitized start document.
    pub fn new(start: Map<String, Value>) -> Self {
        MetadataRecord {
            suitcase_version: SUITCASE_VERSION.to_string(),
            metadata: RunMetadata {
                start,
                stop: None,
                descriptors: DescriptorMap::new(),
            },
        }
    }

    pub fn with_stop(mut self, stop: Map<String, Value>) -> Self {
        self.metadata.stop = Some(stop);
        self
    }

    /// Add a sanitized descriptor under its stream.
    pub fn add_descriptor(
        &mut self,
        stream_name: impl Into<String>,
        uid: impl Into<String>,
        descriptor: Map<String, Value>,
    ) {
        self.metadata
            .descriptors
            .entry(stream_name.into())
            .or_default()
            .insert(uid.into(), descriptor);
    }

    /// Run uid from the start document.
    pub fn uid(&self) -> Option<&str> {
        self.metadata.start.get("uid").and_then(Value::as_str)
    }

    /// Number of descriptors across all streams.
    pub fn descriptor_count(&self) -> usize {
        self.metadata.descriptors.values().map(BTreeMap::len).sum()
    }

    /// Parse a record back from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
