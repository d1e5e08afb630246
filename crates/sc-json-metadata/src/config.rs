//! Export configuration.
//!
//! Every option has a default, so an empty JSON object (or no file at all)
//! is a valid configuration:
//!
//! ```json
//! { "indent": 2, "overwrite": false, "fields": ["uid", "plan_name", "time"] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// Largest accepted pretty-print indent.
pub const MAX_INDENT: usize = 16;

/// Options controlling how the metadata file is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// `None` writes compact JSON; `Some(n)` pretty-prints with `n` spaces.
    pub indent: Option<usize>,

    /// Replace an existing file at the target path.
    pub overwrite: bool,

    /// Create the output directory (and parents) when missing.
    pub create_dir: bool,

    /// Allowlist of start/stop document keys kept in the record.
    pub fields: Option<Vec<String>>,

    /// Terminate the file with a newline.
    pub trailing_newline: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            indent: None,
            overwrite: true,
            create_dir: true,
            fields: None,
            trailing_newline: true,
        }
    }
}

impl ExportConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ExportConfig =
            serde_json::from_str(json).map_err(|e| ExportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
        let config: ExportConfig = serde_json::from_str(&content)
            .map_err(|e| ExportError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate().map_err(|e| match e {
            ExportError::Config(reason) => {
                ExportError::Config(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })?;
        Ok(config)
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_create_dir(mut self, create_dir: bool) -> Self {
        self.create_dir = create_dir;
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_trailing_newline(mut self, enabled: bool) -> Self {
        self.trailing_newline = enabled;
        self
    }

    /// Check option values.
    pub fn validate(&self) -> Result<()> {
        if let Some(indent) = self.indent {
            if indent > MAX_INDENT {
                return Err(ExportError::Config(format!(
                    "indent {} exceeds maximum of {}",
                    indent, MAX_INDENT
                )));
            }
        }
        if let Some(fields) = &self.fields {
            if fields.iter().any(|f| f.trim().is_empty()) {
                return Err(ExportError::Config(
                    "fields allowlist contains an empty key".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Encode a value as the configured JSON text.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let mut out = match self.indent {
            None => serde_json::to_vec(value)?,
            Some(width) => {
                let indent = vec![b' '; width];
                let mut buf = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                value.serialize(&mut ser)?;
                buf
            }
        };
        if self.trailing_newline {
            out.push(b'\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.indent, None);
        assert!(config.overwrite);
        assert!(config.create_dir);
        assert!(config.fields.is_none());
        assert!(config.trailing_newline);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(
            ExportConfig::from_json_str("{}").unwrap(),
            ExportConfig::default()
        );
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config = ExportConfig::from_json_str(r#"{"indent": 4, "overwrite": false}"#).unwrap();
        assert_eq!(config.indent, Some(4));
        assert!(!config.overwrite);
        assert!(config.create_dir);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = ExportConfig::from_json_str(r#"{"sort_keys": true}"#).unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn test_indent_bound() {
        let err = ExportConfig::default().with_indent(64).validate().unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_empty_field_rejected() {
        let err = ExportConfig::default()
            .with_fields(["uid", " "])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn test_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.json");
        fs::write(&path, r#"{"fields": ["uid", "plan_name"]}"#).unwrap();

        let config = ExportConfig::from_path(&path).unwrap();
        assert_eq!(
            config.fields,
            Some(vec!["uid".to_string(), "plan_name".to_string()])
        );
    }

    #[test]
    fn test_from_path_errors_name_file_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");

        fs::write(&path, r#"{"sort_keys": true}"#).unwrap();
        let msg = ExportConfig::from_path(&path).unwrap_err().to_string();
        assert!(msg.starts_with("invalid export configuration: "));
        assert!(msg.contains(&path.display().to_string()));
        assert_eq!(msg.matches("invalid export configuration").count(), 1);

        fs::write(&path, r#"{"indent": 64}"#).unwrap();
        let msg = ExportConfig::from_path(&path).unwrap_err().to_string();
        assert!(msg.contains("exceeds maximum"));
        assert_eq!(msg.matches("invalid export configuration").count(), 1);
    }

    #[test]
    fn test_from_missing_path_is_io() {
        let dir = TempDir::new().unwrap();
        let err = ExportConfig::from_path(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn test_encode_compact_and_pretty() {
        let value = json!({"a": [1, 2]});

        let compact = ExportConfig::default().encode(&value).unwrap();
        assert_eq!(compact, b"{\"a\":[1,2]}\n");

        let pretty = ExportConfig::default()
            .with_indent(2)
            .with_trailing_newline(false)
            .encode(&value)
            .unwrap();
        assert_eq!(
            String::from_utf8(pretty).unwrap(),
            "{\n  \"a\": [\n    1,\n    2\n  ]\n}"
        );
    }
}
