//! Ingest pipeline driver
//!
//! Record Source → Field Sanitizer → Reference Rewriter → Batch Writer, with
//! failures routed to the Error Sink. Records are pulled one at a time, so a
//! file is never held in memory.

use flightload_common::{EntityDocument, EntityKind};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::config::{IngestConfig, WriterConfig};
use crate::error::IngestError;
use crate::rewrite::rewrite;
use crate::sanitize::sanitize_record;
use crate::sink::ErrorSink;
use crate::source::RecordSource;
use crate::store::DocumentStore;
use crate::writer::{BatchWriter, WriteReport};

/// Outcome of loading one entity file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub entity: EntityKind,
    /// Rows pulled from the source
    pub records_read: u64,
    /// Rows dropped before reaching the writer
    pub records_dropped: u64,
    /// The source ended early on a read error
    pub source_failed: bool,
    pub write: WriteReport,
}

impl IngestReport {
    fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            records_read: 0,
            records_dropped: 0,
            source_failed: false,
            write: WriteReport::default(),
        }
    }
}

/// Pulls raw rows and yields finished documents, logging rows it drops
struct DocumentStream<'a, R: Read> {
    kind: EntityKind,
    source: RecordSource<R>,
    sink: &'a ErrorSink,
    progress: &'a ProgressBar,
    records_read: u64,
    records_dropped: u64,
    source_failed: bool,
}

impl<R: Read> Iterator for DocumentStream<'_, R> {
    type Item = EntityDocument;

    fn next(&mut self) -> Option<EntityDocument> {
        loop {
            match self.source.next()? {
                Ok(raw) => {
                    self.records_read += 1;
                    self.progress.inc(1);

                    match rewrite(self.kind, sanitize_record(&raw)) {
                        Ok(document) => return Some(document),
                        Err(e) => {
                            self.records_dropped += 1;
                            let err = IngestError::row_processing(raw.line(), raw.to_line(), e);
                            warn!(entity = %self.kind, line = raw.line(), "{}", err);
                            self.sink.append(err.to_string());
                        },
                    }
                },
                Err(e) => {
                    self.source_failed = true;
                    error!(entity = %self.kind, "{}", e);
                    self.sink.append(e.to_string());
                    return None;
                },
            }
        }
    }
}

/// Runs entity streams against one store and one error log
pub struct Pipeline<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    sink: &'a ErrorSink,
    writer: WriterConfig,
    show_progress: bool,
}

impl<'a, S: DocumentStore + ?Sized> Pipeline<'a, S> {
    pub fn new(store: &'a S, sink: &'a ErrorSink, writer: WriterConfig) -> Self {
        Self {
            store,
            sink,
            writer,
            show_progress: false,
        }
    }

    pub fn from_config(store: &'a S, sink: &'a ErrorSink, config: &IngestConfig) -> Self {
        Self::new(store, sink, config.writer.clone()).with_progress(config.show_progress)
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Load one entity file
    ///
    /// An unopenable file is logged and reported as a failed source; it is
    /// not an error for the caller.
    #[instrument(skip_all, fields(entity = %kind, path = %path.as_ref().display()))]
    pub async fn run_file(&self, kind: EntityKind, path: impl AsRef<Path>) -> IngestReport {
        match RecordSource::open(path.as_ref(), kind.fields()) {
            Ok(source) => self.run_source(kind, source).await,
            Err(e) => {
                error!("{}", e);
                self.sink.append(e.to_string());
                IngestReport {
                    source_failed: true,
                    ..IngestReport::new(kind)
                }
            },
        }
    }

    /// Load rows from an already opened source
    pub async fn run_source<R: Read>(
        &self,
        kind: EntityKind,
        source: RecordSource<R>,
    ) -> IngestReport {
        let progress = self.progress_bar(kind);
        let mut stream = DocumentStream {
            kind,
            source,
            sink: self.sink,
            progress: &progress,
            records_read: 0,
            records_dropped: 0,
            source_failed: false,
        };

        let writer = BatchWriter::new(self.store, self.sink, self.writer.clone());
        let write = writer.write_all(kind.collection(), stream.by_ref()).await;

        let report = IngestReport {
            entity: kind,
            records_read: stream.records_read,
            records_dropped: stream.records_dropped,
            source_failed: stream.source_failed,
            write,
        };

        progress.finish_with_message(format!("{}: {} records", kind, report.records_read));
        info!(
            entity = %kind,
            records_read = report.records_read,
            records_dropped = report.records_dropped,
            documents_written = report.write.documents_written,
            documents_failed = report.write.documents_failed,
            "Finished processing {} and writing to the store",
            kind.default_file_name()
        );

        report
    }

    /// Load every entity from `config.data_dir`, reference targets first
    pub async fn run_all(&self, config: &IngestConfig) -> Vec<IngestReport> {
        let mut reports = Vec::with_capacity(EntityKind::LOAD_ORDER.len());
        for kind in EntityKind::LOAD_ORDER {
            reports.push(self.run_file(kind, config.input_path(kind)).await);
        }
        reports
    }

    fn progress_bar(&self, kind: EntityKind) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}: {pos} records ({per_sec})")
        {
            pb.set_style(style);
        }
        pb.set_message(kind.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}
