//! Reader for the JSON-lines encoding of a document stream.
//!
//! Each non-blank line is a two-element array: `["start", {...}]`.

use std::io::BufRead;

use serde_json::Value;

use crate::document::{json_type_name, Document, DocumentKind};
use crate::error::{DocumentError, Result};

/// Parse one line into a stream item. `line_no` is 1-based and only used
/// for error messages.
pub fn parse_line(line: &str, line_no: usize) -> Result<(DocumentKind, Document)> {
    let value: Value = serde_json::from_str(line).map_err(|source| DocumentError::Json {
        line: line_no,
        source,
    })?;

    let mut pair = match value {
        Value::Array(pair) => pair,
        other => {
            return Err(DocumentError::MalformedLine {
                line: line_no,
                reason: format!("expected [kind, document], found {}", json_type_name(&other)),
            })
        }
    };
    if pair.len() != 2 {
        return Err(DocumentError::MalformedLine {
            line: line_no,
            reason: format!("expected 2 elements, found {}", pair.len()),
        });
    }

    let body = pair.pop().unwrap_or(Value::Null);
    let kind = match pair.pop() {
        Some(Value::String(name)) => name.parse::<DocumentKind>()?,
        other => {
            return Err(DocumentError::MalformedLine {
                line: line_no,
                reason: format!(
                    "document kind must be a string, found {}",
                    other.as_ref().map_or("nothing", json_type_name)
                ),
            })
        }
    };

    let doc = Document::try_from(body).map_err(|e| DocumentError::MalformedLine {
        line: line_no,
        reason: format!("{} {}", kind, e),
    })?;
    Ok((kind, doc))
}

/// Iterator over the items of a JSONL stream.
///
/// Iteration stops after the first I/O error.
pub struct JsonlStream<R> {
    reader: R,
    line_no: usize,
    buf: String,
    failed: bool,
}

impl<R: BufRead> Iterator for JsonlStream<R> {
    type Item = Result<(DocumentKind, Document)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    let line = self.buf.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(parse_line(line, self.line_no));
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(DocumentError::Io(e)));
                }
            }
        }
    }
}

/// Stream items from a JSONL reader, skipping blank lines.
pub fn read_stream<R: BufRead>(reader: R) -> JsonlStream<R> {
    JsonlStream {
        reader,
        line_no: 0,
        buf: String::new(),
        failed: false,
    }
}
