//! Artifact managers: where serialized bytes land.
//!
//! [`FileManager`] writes into a directory with temp-then-rename placement,
//! so readers never observe a partially written file and a failed write
//! leaves nothing behind. [`MemoryBufferManager`] keeps the bytes in memory
//! for in-process consumers.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{ExportError, Result};

/// Label under which the metadata file is recorded.
pub const RUN_METADATA_LABEL: &str = "run_metadata";

/// One artifact written by a manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenArtifact {
    /// Final path (directory-relative name for memory buffers).
    pub path: PathBuf,

    /// Size in bytes.
    pub bytes: u64,

    /// SHA-256 checksum (64 hex characters).
    pub sha256: String,
}

impl WrittenArtifact {
    fn new(path: PathBuf, contents: &[u8]) -> Self {
        WrittenArtifact {
            path,
            bytes: contents.len() as u64,
            sha256: compute_checksum(contents),
        }
    }
}

/// Artifacts grouped by label.
pub type Artifacts = BTreeMap<String, Vec<WrittenArtifact>>;

/// A sink for named output artifacts.
pub trait ArtifactManager {
    /// Store `contents` under `name`, recording it under `label`.
    ///
    /// With `overwrite` false an existing artifact of the same name fails
    /// with [`ExportError::FileExists`] and is left untouched.
    fn write_artifact(
        &mut self,
        label: &str,
        name: &str,
        contents: &[u8],
        overwrite: bool,
    ) -> Result<WrittenArtifact>;

    /// Everything written so far.
    fn artifacts(&self) -> &Artifacts;
}

impl<M: ArtifactManager + ?Sized> ArtifactManager for &mut M {
    fn write_artifact(
        &mut self,
        label: &str,
        name: &str,
        contents: &[u8],
        overwrite: bool,
    ) -> Result<WrittenArtifact> {
        (**self).write_artifact(label, name, contents, overwrite)
    }

    fn artifacts(&self) -> &Artifacts {
        (**self).artifacts()
    }
}

/// Compute SHA-256 checksum of data.
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Writes artifacts as files in one directory.
#[derive(Debug)]
pub struct FileManager {
    directory: PathBuf,
    create_dir: bool,
    artifacts: Artifacts,
}

impl FileManager {
    /// An empty path means the current working directory.
    pub fn new(directory: impl AsRef<Path>) -> Self {
        let directory = directory.as_ref();
        let directory = if directory.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            directory.to_path_buf()
        };
        FileManager {
            directory,
            create_dir: true,
            artifacts: Artifacts::new(),
        }
    }

    /// Whether a missing directory is created on first write.
    pub fn with_create_dir(mut self, create_dir: bool) -> Self {
        self.create_dir = create_dir;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn prepare_directory(&self) -> Result<()> {
        if self.create_dir {
            fs::create_dir_all(&self.directory).map_err(|e| ExportError::io(&self.directory, e))?;
        } else if !self.directory.is_dir() {
            return Err(ExportError::io(
                &self.directory,
                std::io::Error::new(ErrorKind::NotFound, "output directory does not exist"),
            ));
        }
        Ok(())
    }
}

impl ArtifactManager for FileManager {
    fn write_artifact(
        &mut self,
        label: &str,
        name: &str,
        contents: &[u8],
        overwrite: bool,
    ) -> Result<WrittenArtifact> {
        self.prepare_directory()?;
        let target = self.directory.join(name);

        if !overwrite && fs::symlink_metadata(&target).is_ok() {
            return Err(ExportError::FileExists(target));
        }

        // The temp file is removed on drop unless persisted.
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", name))
            .suffix(".tmp")
            .tempfile_in(&self.directory)
            .map_err(|e| ExportError::io(&self.directory, e))?;

        tmp.write_all(contents)
            .map_err(|e| ExportError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| ExportError::io(tmp.path(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(|e| ExportError::io(tmp.path(), e))?;
        }

        if overwrite {
            tmp.persist(&target)
                .map_err(|e| ExportError::io(&target, e.error))?;
        } else {
            tmp.persist_noclobber(&target).map_err(|e| {
                if e.error.kind() == ErrorKind::AlreadyExists {
                    ExportError::FileExists(target.clone())
                } else {
                    ExportError::io(&target, e.error)
                }
            })?;
        }

        let artifact = WrittenArtifact::new(target, contents);
        debug!(path = %artifact.path.display(), bytes = artifact.bytes, label, "Artifact placed");
        self.artifacts
            .entry(label.to_string())
            .or_default()
            .push(artifact.clone());
        Ok(artifact)
    }

    fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }
}

/// Keeps artifacts in memory, keyed by name.
#[derive(Debug, Default)]
pub struct MemoryBufferManager {
    buffers: BTreeMap<String, Vec<u8>>,
    artifacts: Artifacts,
}

impl MemoryBufferManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a named buffer.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.buffers.get(name).map(Vec::as_slice)
    }

    /// Names of all buffers, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(String::as_str)
    }

    pub fn into_buffers(self) -> BTreeMap<String, Vec<u8>> {
        self.buffers
    }
}

impl ArtifactManager for MemoryBufferManager {
    fn write_artifact(
        &mut self,
        label: &str,
        name: &str,
        contents: &[u8],
        overwrite: bool,
    ) -> Result<WrittenArtifact> {
        if !overwrite && self.buffers.contains_key(name) {
            return Err(ExportError::FileExists(PathBuf::from(name)));
        }
        self.buffers.insert(name.to_string(), contents.to_vec());

        let artifact = WrittenArtifact::new(PathBuf::from(name), contents);
        self.artifacts
            .entry(label.to_string())
            .or_default()
            .push(artifact.clone());
        Ok(artifact)
    }

    fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }
}
