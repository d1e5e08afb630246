//! Document values and their sanitization into JSON.
//!
//! Acquisition frameworks put values into documents that JSON has no
//! spelling for (NaN readbacks, raw detector bytes). [`DocValue`] keeps them
//! as-is so the stream can be routed untouched; [`DocValue::sanitize`] is the
//! single place where they are rejected.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::error::{SanitizeError, SanitizeReason};

/// A value carried by a document.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DocValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<DocValue>),
    Object(BTreeMap<String, DocValue>),
}

impl DocValue {
    /// Borrow as a string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of integer and float values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DocValue::Int(v) => Some(*v as f64),
            DocValue::UInt(v) => Some(*v as f64),
            DocValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DocValue::Null)
    }

    /// Convert into a JSON value.
    ///
    /// Fails on the first non-finite float or byte string, reporting its
    /// path relative to this value.
    pub fn sanitize(&self) -> Result<Value, SanitizeError> {
        match self {
            DocValue::Null => Ok(Value::Null),
            DocValue::Bool(b) => Ok(Value::Bool(*b)),
            DocValue::Int(v) => Ok(Value::Number((*v).into())),
            DocValue::UInt(v) => Ok(Value::Number((*v).into())),
            DocValue::Float(v) => Number::from_f64(*v)
                .map(Value::Number)
                .ok_or(SanitizeError {
                    path: String::new(),
                    reason: SanitizeReason::NonFinite(*v),
                }),
            DocValue::String(s) => Ok(Value::String(s.clone())),
            DocValue::Bytes(bytes) => Err(SanitizeError {
                path: String::new(),
                reason: SanitizeReason::Bytes(bytes.len()),
            }),
            DocValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| item.sanitize().map_err(|e| e.within(&format!("[{}]", i))))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            DocValue::Object(fields) => sanitize_fields(fields).map(Value::Object),
        }
    }
}

/// Sanitize a key/value mapping into a JSON object.
pub(crate) fn sanitize_fields(
    fields: &BTreeMap<String, DocValue>,
) -> Result<Map<String, Value>, SanitizeError> {
    let mut out = Map::new();
    for (key, value) in fields {
        let json = value.sanitize().map_err(|e| e.within(key))?;
        out.insert(key.clone(), json);
    }
    Ok(out)
}

impl From<Value> for DocValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DocValue::Null,
            Value::Bool(b) => DocValue::Bool(b),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    DocValue::Int(v)
                } else if let Some(v) = n.as_u64() {
                    DocValue::UInt(v)
                } else {
                    DocValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => DocValue::String(s),
            Value::Array(items) => DocValue::Array(items.into_iter().map(DocValue::from).collect()),
            Value::Object(map) => DocValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, DocValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for DocValue {
    fn from(v: bool) -> Self {
        DocValue::Bool(v)
    }
}

impl From<i64> for DocValue {
    fn from(v: i64) -> Self {
        DocValue::Int(v)
    }
}

impl From<u64> for DocValue {
    fn from(v: u64) -> Self {
        DocValue::UInt(v)
    }
}

impl From<f64> for DocValue {
    fn from(v: f64) -> Self {
        DocValue::Float(v)
    }
}

impl From<&str> for DocValue {
    fn from(v: &str) -> Self {
        DocValue::String(v.to_string())
    }
}

impl From<String> for DocValue {
    fn from(v: String) -> Self {
        DocValue::String(v)
    }
}

impl From<Vec<DocValue>> for DocValue {
    fn from(v: Vec<DocValue>) -> Self {
        DocValue::Array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_integer_kinds() {
        assert_eq!(DocValue::from(json!(-3)), DocValue::Int(-3));
        assert_eq!(DocValue::from(json!(u64::MAX)), DocValue::UInt(u64::MAX));
        assert_eq!(DocValue::from(json!(0.25)), DocValue::Float(0.25));
    }

    #[test]
    fn test_sanitize_nested_object() {
        let value = DocValue::from(json!({
            "motors": ["x", "y"],
            "hints": {"dimensions": [[["x"], "primary"]]},
            "num_points": 10
        }));
        assert_eq!(
            value.sanitize().unwrap(),
            json!({
                "motors": ["x", "y"],
                "hints": {"dimensions": [[["x"], "primary"]]},
                "num_points": 10
            })
        );
    }

    #[test]
    fn test_sanitize_rejects_nan_with_path() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "readings".to_string(),
            DocValue::Array(vec![DocValue::Float(1.0), DocValue::Float(f64::NAN)]),
        );
        let err = DocValue::Object(fields).sanitize().unwrap_err();
        assert_eq!(err.path, "readings[1]");
        assert!(matches!(err.reason, SanitizeReason::NonFinite(v) if v.is_nan()));
    }

    #[test]
    fn test_sanitize_rejects_infinity() {
        let err = DocValue::Float(f64::NEG_INFINITY).sanitize().unwrap_err();
        assert_eq!(err.path, "");
        assert_eq!(err.reason, SanitizeReason::NonFinite(f64::NEG_INFINITY));
    }

    #[test]
    fn test_sanitize_rejects_bytes() {
        let mut inner = BTreeMap::new();
        inner.insert("frame".to_string(), DocValue::Bytes(vec![0xde, 0xad]));
        let mut outer = BTreeMap::new();
        outer.insert("detector".to_string(), DocValue::Object(inner));

        let err = DocValue::Object(outer).sanitize().unwrap_err();
        assert_eq!(err.path, "detector.frame");
        assert_eq!(err.reason, SanitizeReason::Bytes(2));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(DocValue::from("abc").as_str(), Some("abc"));
        assert_eq!(DocValue::Int(2).as_f64(), Some(2.0));
        assert_eq!(DocValue::Bool(true).as_f64(), None);
        assert!(DocValue::default().is_null());
    }
}
