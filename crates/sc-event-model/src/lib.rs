//! Document model for data-acquisition document streams.
//!
//! An acquisition run is described by an ordered stream of `(kind, document)`
//! pairs: one `start` document, any number of `descriptor` and bulk
//! (`event`, `datum`, ...) documents, and a closing `stop` document.
//!
//! This crate provides:
//! - [`DocumentKind`] and [`Document`] for the stream items
//! - [`DocValue`], a value model wide enough for anything a document may
//!   carry (non-finite floats and raw bytes included)
//! - Sanitization of documents into `serde_json` values
//! - [`DocumentRouter`], dispatch of stream items by kind
//! - A reader for the JSON-lines encoding of a stream
//!
//! # Example
//!
//! ```
//! use sc_event_model::{Document, DocumentKind};
//! use serde_json::json;
//!
//! let start = Document::try_from(json!({"uid": "abc", "time": 1.5e9})).unwrap();
//! assert_eq!(start.uid(), Some("abc"));
//! assert_eq!("start".parse::<DocumentKind>().unwrap(), DocumentKind::Start);
//! ```

pub mod document;
pub mod error;
pub mod jsonl;
pub mod router;
pub mod value;

pub use document::{Document, DocumentKind, RunUid, DEFAULT_STREAM_NAME};
pub use error::{DocumentError, Result, SanitizeError, SanitizeReason};
pub use router::DocumentRouter;
pub use value::DocValue;
