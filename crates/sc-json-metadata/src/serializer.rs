//! Router that accumulates a run's metadata and writes it on `finish`.

use std::collections::BTreeMap;

use sc_event_model::{Document, DocumentKind, DocumentRouter, RunUid, DEFAULT_STREAM_NAME};
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::manager::{ArtifactManager, Artifacts, RUN_METADATA_LABEL};
use crate::record::MetadataRecord;
use crate::template::{artifact_file_name, render_prefix, DEFAULT_FILE_PREFIX};

/// Serializes the metadata of one run.
///
/// Feed the run's documents through [`DocumentRouter::route`], then call
/// [`Serializer::finish`]. Nothing is written before `finish`, so an error
/// while routing leaves the output untouched.
pub struct Serializer<M: ArtifactManager> {
    manager: M,
    file_prefix: String,
    config: ExportConfig,
    uid: Option<RunUid>,
    start: Option<Document>,
    stop: Option<Document>,
    /// stream name -> descriptor uid -> descriptor
    descriptors: BTreeMap<String, BTreeMap<String, Document>>,
    bulk_documents: usize,
    routed: usize,
}

impl<M: ArtifactManager> Serializer<M> {
    /// Create a serializer writing through `manager`.
    ///
    /// `file_prefix` defaults to `{uid}`.
    pub fn new(manager: M, file_prefix: Option<&str>, config: ExportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Serializer {
            manager,
            file_prefix: file_prefix.unwrap_or(DEFAULT_FILE_PREFIX).to_string(),
            config,
            uid: None,
            start: None,
            stop: None,
            descriptors: BTreeMap::new(),
            bulk_documents: 0,
            routed: 0,
        })
    }

    /// Uid of the run, once its start document has been seen.
    pub fn uid(&self) -> Option<&RunUid> {
        self.uid.as_ref()
    }

    /// Documents routed so far.
    pub fn routed(&self) -> usize {
        self.routed
    }

    /// Route one stream item, counting it.
    pub fn push(&mut self, kind: DocumentKind, doc: Document) -> Result<()> {
        self.routed += 1;
        self.route(kind, doc)
    }

    /// Build the record without writing it.
    pub fn record(&self) -> Result<MetadataRecord> {
        let start = self.start.as_ref().ok_or_else(|| self.missing_start())?;
        self.build_record(start)
    }

    /// Render the file name, build the record and write it.
    pub fn finish(mut self) -> Result<Artifacts> {
        let start = self.start.take().ok_or_else(|| self.missing_start())?;
        if self.stop.is_none() {
            warn!(uid = ?self.uid, "Document stream ended without a stop document");
        }

        let prefix = render_prefix(&self.file_prefix, &start)?;
        let name = artifact_file_name(&prefix);
        let record = self.build_record(&start)?;
        let contents = self.config.encode(&record)?;

        debug!(
            routed = self.routed,
            descriptors = record.descriptor_count(),
            bulk_documents = self.bulk_documents,
            "Metadata record built"
        );

        let artifact =
            self.manager
                .write_artifact(RUN_METADATA_LABEL, &name, &contents, self.config.overwrite)?;

        info!(
            uid = record.uid().unwrap_or_default(),
            path = %artifact.path.display(),
            bytes = artifact.bytes,
            sha256 = %artifact.sha256,
            "Run metadata exported"
        );

        Ok(self.manager.artifacts().clone())
    }

    fn missing_start(&self) -> ExportError {
        if self.routed == 0 && self.descriptors.is_empty() && self.stop.is_none() {
            ExportError::InvalidStream("document stream is empty".to_string())
        } else {
            ExportError::InvalidStream("document stream has no start document".to_string())
        }
    }

    fn build_record(&self, start: &Document) -> Result<MetadataRecord> {
        let start = match &self.config.fields {
            Some(fields) => {
                let mut keep: Vec<&str> = fields.iter().map(String::as_str).collect();
                keep.push("uid");
                start.retain_keys(&keep)
            }
            None => start.clone(),
        };
        let start = start
            .sanitize()
            .map_err(|e| e.within("start").within("metadata"))?;
        let mut record = MetadataRecord::new(start);

        if let Some(stop) = &self.stop {
            let stop = match &self.config.fields {
                Some(fields) => stop.retain_keys(fields),
                None => stop.clone(),
            };
            let stop = stop
                .sanitize()
                .map_err(|e| e.within("stop").within("metadata"))?;
            record = record.with_stop(stop);
        }

        for (stream, by_uid) in &self.descriptors {
            for (uid, descriptor) in by_uid {
                let sanitized = descriptor.sanitize().map_err(|e| {
                    e.within(uid)
                        .within(stream)
                        .within("descriptors")
                        .within("metadata")
                })?;
                record.add_descriptor(stream.clone(), uid.clone(), sanitized);
            }
        }

        Ok(record)
    }

    fn require_start(&self, kind: DocumentKind) -> Result<&RunUid> {
        self.uid.as_ref().ok_or_else(|| {
            ExportError::InvalidStream(format!("{} document arrived before the start document", kind))
        })
    }

    fn check_run(&self, kind: DocumentKind, doc: &Document) -> Result<()> {
        let uid = self.require_start(kind)?;
        match doc.run_start() {
            Some(run_start) if run_start != uid.as_str() => Err(ExportError::InvalidStream(format!(
                "{} document belongs to run {}, not {}",
                kind, run_start, uid
            ))),
            _ => Ok(()),
        }
    }
}

impl<M: ArtifactManager> DocumentRouter for Serializer<M> {
    type Error = ExportError;

    fn start(&mut self, doc: Document) -> Result<()> {
        if let Some(uid) = &self.uid {
            return Err(ExportError::InvalidStream(format!(
                "second start document after run {}; export one run at a time",
                uid
            )));
        }
        let uid = doc.run_uid().ok_or_else(|| {
            ExportError::InvalidStream("start document has no string 'uid'".to_string())
        })?;
        debug!(uid = %uid, "Start document received");
        self.uid = Some(uid);
        self.start = Some(doc);
        Ok(())
    }

    fn stop(&mut self, doc: Document) -> Result<()> {
        self.check_run(DocumentKind::Stop, &doc)?;
        if self.stop.is_some() {
            return Err(ExportError::InvalidStream(
                "second stop document for the same run".to_string(),
            ));
        }
        self.stop = Some(doc);
        Ok(())
    }

    fn descriptor(&mut self, doc: Document) -> Result<()> {
        self.check_run(DocumentKind::Descriptor, &doc)?;
        let uid = doc
            .uid()
            .ok_or_else(|| {
                ExportError::InvalidStream("descriptor document has no string 'uid'".to_string())
            })?
            .to_string();
        if self.descriptors.values().any(|by_uid| by_uid.contains_key(&uid)) {
            return Err(ExportError::InvalidStream(format!(
                "descriptor {} was sent twice",
                uid
            )));
        }
        let stream = doc.get_str("name").unwrap_or(DEFAULT_STREAM_NAME).to_string();
        debug!(stream = %stream, descriptor = %uid, "Descriptor received");
        self.descriptors.entry(stream).or_default().insert(uid, doc);
        Ok(())
    }

    fn event(&mut self, _doc: Document) -> Result<()> {
        self.bulk_documents += 1;
        Ok(())
    }

    fn event_page(&mut self, _doc: Document) -> Result<()> {
        self.bulk_documents += 1;
        Ok(())
    }

    fn resource(&mut self, _doc: Document) -> Result<()> {
        self.bulk_documents += 1;
        Ok(())
    }

    fn datum(&mut self, _doc: Document) -> Result<()> {
        self.bulk_documents += 1;
        Ok(())
    }

    fn datum_page(&mut self, _doc: Document) -> Result<()> {
        self.bulk_documents += 1;
        Ok(())
    }
}
