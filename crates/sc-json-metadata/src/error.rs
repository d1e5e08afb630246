//! Error types for metadata export.

use std::path::PathBuf;

use sc_event_model::{DocumentError, SanitizeError};
use thiserror::Error;

/// Errors that can occur while exporting a run's metadata.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The document stream is empty or does not describe exactly one run.
    #[error("invalid document stream: {0}")]
    InvalidStream(String),

    /// Filesystem access failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A metadata value has no JSON representation.
    #[error("cannot serialize '{path}': {reason}")]
    Serialization { path: String, reason: String },

    /// The JSON encoder itself failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The target exists and overwriting is disabled.
    #[error("file already exists: {}", .0.display())]
    FileExists(PathBuf),

    /// The file prefix template could not be rendered.
    #[error("file prefix template error: {0}")]
    Template(String),

    /// Configuration failed to load or validate.
    #[error("invalid export configuration: {0}")]
    Config(String),
}

impl ExportError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short stable name of the error class, used in log fields.
    pub fn class(&self) -> &'static str {
        match self {
            ExportError::InvalidStream(_) => "invalid_stream",
            ExportError::Io { .. } => "io",
            ExportError::Serialization { .. } | ExportError::Json(_) => "serialization",
            ExportError::FileExists(_) => "file_exists",
            ExportError::Template(_) => "template",
            ExportError::Config(_) => "config",
        }
    }
}

impl From<SanitizeError> for ExportError {
    fn from(err: SanitizeError) -> Self {
        ExportError::Serialization {
            path: err.path,
            reason: err.reason.to_string(),
        }
    }
}

impl From<DocumentError> for ExportError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Io(source) => ExportError::Io {
                path: PathBuf::from("<document stream>"),
                source,
            },
            other => ExportError::InvalidStream(other.to_string()),
        }
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sc_event_model::SanitizeReason;

    #[test]
    fn test_sanitize_error_maps_to_serialization() {
        let err: ExportError = SanitizeError {
            path: "metadata.start.exposure".to_string(),
            reason: SanitizeReason::NonFinite(f64::INFINITY),
        }
        .into();
        assert_eq!(err.class(), "serialization");
        assert_eq!(
            err.to_string(),
            "cannot serialize 'metadata.start.exposure': non-finite number inf"
        );
    }

    #[test]
    fn test_document_error_maps_to_invalid_stream() {
        let err: ExportError = DocumentError::UnknownKind("bulk".to_string()).into();
        assert!(matches!(err, ExportError::InvalidStream(_)));
        assert_eq!(err.class(), "invalid_stream");
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let err = ExportError::io(
            "/nope/x-meta.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error at /nope/x-meta.json: denied");
    }
}
