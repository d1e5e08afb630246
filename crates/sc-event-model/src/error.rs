//! Error types for document handling.

use thiserror::Error;

/// Errors raised while parsing or inspecting documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Document kind name not recognized.
    #[error("unknown document kind: {0}")]
    UnknownKind(String),

    /// Document body was not a JSON object.
    #[error("document body is not an object (found {found})")]
    NotAnObject { found: String },

    /// A JSONL line did not have the `[kind, body]` shape.
    #[error("line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    /// A JSONL line was not valid JSON.
    #[error("line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a value could not be represented as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum SanitizeReason {
    /// NaN or an infinity.
    NonFinite(f64),
    /// Raw bytes have no textual encoding.
    Bytes(usize),
}

impl std::fmt::Display for SanitizeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanitizeReason::NonFinite(v) => write!(f, "non-finite number {}", v),
            SanitizeReason::Bytes(len) => write!(f, "{} raw bytes with no JSON encoding", len),
        }
    }
}

/// A value inside a document that JSON cannot represent.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("value at '{path}' is not JSON-representable: {reason}")]
pub struct SanitizeError {
    /// Dotted key path to the value, e.g. `start.detectors[2]`.
    pub path: String,
    pub reason: SanitizeReason,
}

impl SanitizeError {
    /// Prefix the path with an enclosing key.
    pub fn within(mut self, key: &str) -> Self {
        self.path = if self.path.is_empty() {
            key.to_string()
        } else if self.path.starts_with('[') {
            format!("{}{}", key, self.path)
        } else {
            format!("{}.{}", key, self.path)
        };
        self
    }
}

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;
