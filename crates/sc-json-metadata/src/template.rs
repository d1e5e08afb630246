//! File prefix templates.
//!
//! A prefix such as `{proposal_id}-{sample_name}` is filled from the run's
//! start document. A field may carry a strftime spec, `{time:%Y-%m-%d_%H-%M}`,
//! which formats a numeric field as UNIX epoch seconds in UTC. Braces are
//! escaped by doubling them.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use sc_event_model::{DocValue, Document};

use crate::error::{ExportError, Result};

/// Prefix used when the caller supplies none.
pub const DEFAULT_FILE_PREFIX: &str = "{uid}";

/// Suffix appended to the rendered prefix.
pub const META_SUFFIX: &str = "meta.json";

static RE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}:]*)(?::([^{}]*))?\}").expect("placeholder regex is valid")
});

/// Render `template` against the start document.
pub fn render_prefix(template: &str, start: &Document) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in RE_PLACEHOLDER.captures_iter(template) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        push_literal(&mut out, &template[last..whole.start], last)?;
        last = whole.end;

        match &template[whole.clone()] {
            "{{" => out.push('{'),
            "}}" => out.push('}'),
            _ => {
                let name = caps.get(1).map_or("", |m| m.as_str());
                if name.is_empty() {
                    return Err(ExportError::Template(format!(
                        "empty field name at position {}",
                        whole.start
                    )));
                }
                let value = start.get(name).ok_or_else(|| {
                    ExportError::Template(format!("field '{}' is not in the start document", name))
                })?;
                match caps.get(2).map(|m| m.as_str()).filter(|s| !s.is_empty()) {
                    Some(spec) => out.push_str(&format_time(name, value, spec)?),
                    None => out.push_str(&render_value(name, value)?),
                }
            }
        }
    }
    push_literal(&mut out, &template[last..], last)?;

    check_file_safe(&out)?;
    Ok(out)
}

/// File name for a rendered prefix: `<prefix>-meta.json`, or `meta.json`
/// when the prefix is empty.
pub fn artifact_file_name(prefix: &str) -> String {
    if prefix.is_empty() {
        META_SUFFIX.to_string()
    } else {
        format!("{}-{}", prefix, META_SUFFIX)
    }
}

fn push_literal(out: &mut String, literal: &str, offset: usize) -> Result<()> {
    if let Some(pos) = literal.find(['{', '}']) {
        return Err(ExportError::Template(format!(
            "unbalanced brace at position {}",
            offset + pos
        )));
    }
    out.push_str(literal);
    Ok(())
}

fn render_value(name: &str, value: &DocValue) -> Result<String> {
    if let DocValue::String(s) = value {
        return Ok(s.clone());
    }
    let json = value
        .sanitize()
        .map_err(|e| ExportError::Template(format!("field '{}': {}", name, e.reason)))?;
    Ok(json.to_string())
}

fn format_time(name: &str, value: &DocValue, spec: &str) -> Result<String> {
    let epoch = value.as_f64().filter(|t| t.is_finite()).ok_or_else(|| {
        ExportError::Template(format!(
            "format spec '{}' needs a numeric epoch time, field '{}' is not one",
            spec, name
        ))
    })?;

    let items: Vec<Item<'_>> = StrftimeItems::new(spec).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ExportError::Template(format!(
            "invalid time format spec '{}'",
            spec
        )));
    }

    let secs = epoch.floor();
    let nanos = ((epoch - secs) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    let time = DateTime::from_timestamp(secs as i64, nanos).ok_or_else(|| {
        ExportError::Template(format!("field '{}' is out of range as a time", name))
    })?;

    let mut out = String::new();
    write!(out, "{}", time.format_with_items(items.iter()))
        .map_err(|_| ExportError::Template(format!("cannot format field '{}'", name)))?;
    Ok(out)
}

fn check_file_safe(prefix: &str) -> Result<()> {
    if prefix.contains(['/', '\\', '\0']) || prefix == "." || prefix == ".." {
        return Err(ExportError::Template(format!(
            "rendered prefix '{}' is not a plain file name",
            prefix
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_doc() -> Document {
        Document::new()
            .with("uid", "9b82da80-a966-427e-8701-32cd6b807692")
            .with("proposal_id", 1234i64)
            .with("sample_name", "LaB6")
            .with("time", 1_546_300_800.25)
            .with(
                "motors",
                DocValue::Array(vec![DocValue::from("x"), DocValue::from("y")]),
            )
    }

    #[test]
    fn test_default_prefix_is_uid() {
        let prefix = render_prefix(DEFAULT_FILE_PREFIX, &start_doc()).unwrap();
        assert_eq!(prefix, "9b82da80-a966-427e-8701-32cd6b807692");
    }

    #[test]
    fn test_literal_prefix() {
        assert_eq!(render_prefix("run1", &start_doc()).unwrap(), "run1");
    }

    #[test]
    fn test_multiple_fields() {
        let prefix = render_prefix("{proposal_id}-{sample_name}", &start_doc()).unwrap();
        assert_eq!(prefix, "1234-LaB6");
    }

    #[test]
    fn test_array_field_renders_compact_json() {
        let prefix = render_prefix("{motors}", &start_doc()).unwrap();
        assert_eq!(prefix, r#"["x","y"]"#);
    }

    #[test]
    fn test_time_format_spec() {
        // 2019-01-01T00:00:00.25Z
        let prefix = render_prefix("{time:%Y-%m-%d_%H-%M}", &start_doc()).unwrap();
        assert_eq!(prefix, "2019-01-01_00-00");
    }

    #[test]
    fn test_escaped_braces() {
        let prefix = render_prefix("{{x}}-{sample_name}", &start_doc()).unwrap();
        assert_eq!(prefix, "{x}-LaB6");
    }

    #[test]
    fn test_missing_field() {
        let err = render_prefix("{plan_name}", &start_doc()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "file prefix template error: field 'plan_name' is not in the start document"
        );
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(matches!(
            render_prefix("{uid", &start_doc()),
            Err(ExportError::Template(_))
        ));
        assert!(matches!(
            render_prefix("uid}", &start_doc()),
            Err(ExportError::Template(_))
        ));
    }

    #[test]
    fn test_empty_field_name() {
        assert!(render_prefix("{}", &start_doc()).is_err());
    }

    #[test]
    fn test_format_spec_on_string_rejected() {
        let err = render_prefix("{sample_name:%Y}", &start_doc()).unwrap_err();
        assert!(err.to_string().contains("numeric epoch time"));
    }

    #[test]
    fn test_invalid_strftime_rejected() {
        let err = render_prefix("{time:%Q}", &start_doc()).unwrap_err();
        assert!(err.to_string().contains("invalid time format spec"));
    }

    #[test]
    fn test_path_separator_rejected() {
        let doc = Document::new().with("uid", "../escape");
        assert!(matches!(
            render_prefix("{uid}", &doc),
            Err(ExportError::Template(_))
        ));
        assert!(render_prefix("..", &doc).is_err());
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(artifact_file_name("run1"), "run1-meta.json");
        assert_eq!(artifact_file_name(""), "meta.json");
    }
}
