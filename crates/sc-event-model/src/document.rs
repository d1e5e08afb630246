//! Document kinds, document bodies and run identity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocumentError, SanitizeError};
use crate::value::{sanitize_fields, DocValue};

/// Stream name used when a descriptor does not carry one.
pub const DEFAULT_STREAM_NAME: &str = "primary";

/// The kind of a document in a run's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Opens a run; carries the run uid and user metadata.
    Start,
    /// Closes a run; carries exit status.
    Stop,
    /// Describes the data keys of one event stream.
    Descriptor,
    Event,
    EventPage,
    /// Points at externally stored data.
    Resource,
    Datum,
    DatumPage,
}

impl DocumentKind {
    /// All kinds in canonical order.
    pub const ALL: [DocumentKind; 8] = [
        DocumentKind::Start,
        DocumentKind::Stop,
        DocumentKind::Descriptor,
        DocumentKind::Event,
        DocumentKind::EventPage,
        DocumentKind::Resource,
        DocumentKind::Datum,
        DocumentKind::DatumPage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Start => "start",
            DocumentKind::Stop => "stop",
            DocumentKind::Descriptor => "descriptor",
            DocumentKind::Event => "event",
            DocumentKind::EventPage => "event_page",
            DocumentKind::Resource => "resource",
            DocumentKind::Datum => "datum",
            DocumentKind::DatumPage => "datum_page",
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DocumentError::UnknownKind(s.to_string()))
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier of a run, taken from its start document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunUid(String);

impl RunUid {
    /// Accepts any non-blank string.
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().is_empty() {
            return None;
        }
        Some(RunUid(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The body of one document: a mapping from keys to values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: BTreeMap<String, DocValue>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DocValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DocValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.fields.get(key)
    }

    /// String field lookup; `None` when missing or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(DocValue::as_str)
    }

    /// The document's own `uid`.
    pub fn uid(&self) -> Option<&str> {
        self.get_str("uid")
    }

    /// The uid of the run this document belongs to (descriptors, stops).
    pub fn run_start(&self) -> Option<&str> {
        self.get_str("run_start")
    }

    /// Run identity when this is a start document.
    pub fn run_uid(&self) -> Option<RunUid> {
        self.uid().and_then(RunUid::parse)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, DocValue> {
        &self.fields
    }

    /// Copy keeping only `keys` (missing keys are skipped).
    pub fn retain_keys<S: AsRef<str>>(&self, keys: &[S]) -> Document {
        let fields = self
            .fields
            .iter()
            .filter(|(k, _)| keys.iter().any(|wanted| wanted.as_ref() == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Document { fields }
    }

    /// Convert into a JSON object, rejecting values JSON cannot hold.
    pub fn sanitize(&self) -> Result<Map<String, Value>, SanitizeError> {
        sanitize_fields(&self.fields)
    }
}

impl TryFrom<Value> for Document {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Document::from(map)),
            other => Err(DocumentError::NotAnObject {
                found: json_type_name(&other).to_string(),
            }),
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Document {
            fields: map.into_iter().map(|(k, v)| (k, DocValue::from(v))).collect(),
        }
    }
}

impl FromIterator<(String, DocValue)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, DocValue)>>(iter: I) -> Self {
        Document {
            fields: iter.into_iter().collect(),
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
