//! Export the metadata of a data-acquisition run to a JSON file.
//!
//! A run's document stream (`start`, `descriptor`s, bulk documents, `stop`)
//! goes in; one file named `<file_prefix>-meta.json` comes out, where the
//! prefix defaults to the run's uid. The file holds:
//!
//! ```json
//! {
//!   "suitcase_version": "0.1.0",
//!   "metadata": {
//!     "start": { ... },
//!     "stop": { ... },
//!     "descriptors": { "<stream name>": { "<descriptor uid>": { ... } } }
//!   }
//! }
//! ```
//!
//! The file is placed atomically: it is written to a temporary file in the
//! output directory and renamed into place, so a failed export leaves
//! nothing behind.
//!
//! # Example
//!
//! ```no_run
//! use sc_event_model::{Document, DocumentKind};
//! use sc_json_metadata::{export, ExportConfig};
//!
//! let uid = "9b82da80-a966-427e-8701-32cd6b807692";
//! let documents = vec![
//!     (DocumentKind::Start, Document::new().with("uid", uid).with("time", 1.5e9)),
//!     (DocumentKind::Stop, Document::new().with("run_start", uid).with("exit_status", "success")),
//! ];
//!
//! let path = export(documents, "/tmp/metadata", None, &ExportConfig::default()).unwrap();
//! assert!(path.ends_with("9b82da80-a966-427e-8701-32cd6b807692-meta.json"));
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod record;
pub mod serializer;
pub mod template;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use sc_event_model::{jsonl, Document, DocumentKind};

pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use manager::{
    ArtifactManager, Artifacts, FileManager, MemoryBufferManager, WrittenArtifact,
    RUN_METADATA_LABEL,
};
pub use record::{MetadataRecord, RunMetadata, SUITCASE_VERSION};
pub use serializer::Serializer;
pub use template::DEFAULT_FILE_PREFIX;

/// Export one run's metadata into `directory`.
///
/// Returns the path of the written `<prefix>-meta.json`. `file_prefix`
/// defaults to `{uid}`; see [`template`] for the placeholder syntax.
pub fn export<I, P>(
    documents: I,
    directory: P,
    file_prefix: Option<&str>,
    config: &ExportConfig,
) -> Result<PathBuf>
where
    I: IntoIterator<Item = (DocumentKind, Document)>,
    P: AsRef<Path>,
{
    let mut manager = FileManager::new(directory).with_create_dir(config.create_dir);
    let artifacts = export_to(documents, &mut manager, file_prefix, config)?;
    metadata_path(&artifacts)
}

/// Export one run's metadata through any artifact manager.
///
/// Returns everything the manager has recorded, grouped by label; the
/// metadata file is under [`RUN_METADATA_LABEL`].
pub fn export_to<I, M>(
    documents: I,
    manager: M,
    file_prefix: Option<&str>,
    config: &ExportConfig,
) -> Result<Artifacts>
where
    I: IntoIterator<Item = (DocumentKind, Document)>,
    M: ArtifactManager,
{
    let mut serializer = Serializer::new(manager, file_prefix, config.clone())?;
    for (kind, doc) in documents {
        serializer.push(kind, doc)?;
    }
    serializer.finish()
}

/// Export a run whose documents are encoded as JSON lines
/// (`["start", {...}]` per line).
pub fn export_jsonl<R, P>(
    reader: R,
    directory: P,
    file_prefix: Option<&str>,
    config: &ExportConfig,
) -> Result<PathBuf>
where
    R: BufRead,
    P: AsRef<Path>,
{
    let mut manager = FileManager::new(directory).with_create_dir(config.create_dir);
    let mut serializer = Serializer::new(&mut manager, file_prefix, config.clone())?;
    for item in jsonl::read_stream(reader) {
        let (kind, doc) = item?;
        serializer.push(kind, doc)?;
    }
    let artifacts = serializer.finish()?;
    metadata_path(&artifacts)
}

fn metadata_path(artifacts: &Artifacts) -> Result<PathBuf> {
    artifacts
        .get(RUN_METADATA_LABEL)
        .and_then(|written| written.last())
        .map(|artifact| artifact.path.clone())
        .ok_or_else(|| ExportError::InvalidStream("no metadata artifact was written".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run(uid: &str) -> Vec<(DocumentKind, Document)> {
        vec![
            (
                DocumentKind::Start,
                Document::new().with("uid", uid).with("time", 0.0),
            ),
            (
                DocumentKind::Stop,
                Document::new().with("run_start", uid).with("exit_status", "success"),
            ),
        ]
    }

    #[test]
    fn test_export_default_name() {
        let dir = TempDir::new().unwrap();
        let path = export(run("abc"), dir.path(), None, &ExportConfig::default()).unwrap();
        assert_eq!(path, dir.path().join("abc-meta.json"));
        assert!(path.exists());
    }

    #[test]
    fn test_export_to_memory() {
        let mut manager = MemoryBufferManager::new();
        let artifacts =
            export_to(run("abc"), &mut manager, Some("run1"), &ExportConfig::default()).unwrap();
        assert_eq!(
            artifacts[RUN_METADATA_LABEL][0].path,
            PathBuf::from("run1-meta.json")
        );
        assert!(manager.get("run1-meta.json").is_some());
    }

    #[test]
    fn test_export_jsonl() {
        let dir = TempDir::new().unwrap();
        let input = "[\"start\", {\"uid\": \"j1\", \"time\": 0}]\n[\"stop\", {\"run_start\": \"j1\"}]\n";
        let path = export_jsonl(Cursor::new(input), dir.path(), None, &ExportConfig::default())
            .unwrap();
        assert_eq!(path, dir.path().join("j1-meta.json"));
    }

    #[test]
    fn test_export_jsonl_bad_line_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = "[\"start\", {\"uid\": \"j1\"}]\nnot json\n";
        let err = export_jsonl(Cursor::new(input), dir.path(), None, &ExportConfig::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidStream(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
