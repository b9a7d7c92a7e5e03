//! Batch Writer
//!
//! Submits documents to a [`DocumentStore`] in one of two modes:
//!
//! - **Batched**: accumulate up to `batch_size` documents, submit them in one
//!   call, pause, and start a new batch. A partial batch left at the end of the
//!   stream is flushed once.
//! - **Per-record**: one call per document as soon as it is produced, with at
//!   most `max_in_flight` calls outstanding.
//!
//! A failed unit (batch or record) is logged to the [`ErrorSink`] and skipped;
//! the stream carries on with the next unit. Nothing is retried.

use flightload_common::EntityDocument;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{WriteMode, WriterConfig};
use crate::error::{IngestError, StoreError};
use crate::sink::ErrorSink;
use crate::store::DocumentStore;

/// Counters for one entity stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    /// Store calls made
    pub units_attempted: usize,
    /// Store calls that failed
    pub units_failed: usize,
    pub documents_written: usize,
    pub documents_failed: usize,
}

impl WriteReport {
    fn record_success(&mut self, documents: usize) {
        self.units_attempted += 1;
        self.documents_written += documents;
    }

    /// A unit the store accepted but only partly created
    fn record_shortfall(&mut self, written: usize, missing: usize) {
        self.record_success(written);
        self.documents_failed += missing;
    }

    fn record_failure(&mut self, documents: usize) {
        self.units_attempted += 1;
        self.units_failed += 1;
        self.documents_failed += documents;
    }
}

/// Documents waiting to be submitted together
struct Batch {
    documents: Vec<EntityDocument>,
    capacity: usize,
    /// 1-based stream position of the first document
    first_position: usize,
}

impl Batch {
    fn new(capacity: usize, first_position: usize) -> Self {
        Self {
            documents: Vec::with_capacity(capacity),
            capacity,
            first_position,
        }
    }

    fn push(&mut self, document: EntityDocument) {
        self.documents.push(document);
    }

    fn is_full(&self) -> bool {
        self.documents.len() >= self.capacity
    }

    fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn last_position(&self) -> usize {
        self.first_position + self.documents.len().saturating_sub(1)
    }
}

/// Writes one entity stream to the store
pub struct BatchWriter<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    sink: &'a ErrorSink,
    config: WriterConfig,
}

impl<'a, S: DocumentStore + ?Sized> BatchWriter<'a, S> {
    pub fn new(store: &'a S, sink: &'a ErrorSink, config: WriterConfig) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    /// Submit every document to `collection`, in input order
    pub async fn write_all<I>(&self, collection: &str, documents: I) -> WriteReport
    where
        I: IntoIterator<Item = EntityDocument>,
    {
        match self.config.mode {
            WriteMode::Batched => self.write_batched(collection, documents).await,
            WriteMode::PerRecord => self.write_per_record(collection, documents).await,
        }
    }

    async fn write_batched<I>(&self, collection: &str, documents: I) -> WriteReport
    where
        I: IntoIterator<Item = EntityDocument>,
    {
        let capacity = self.config.batch_size.max(1);
        let pause = self.config.batch_pause();
        let mut report = WriteReport::default();
        let mut documents = documents.into_iter().peekable();
        let mut batch = Batch::new(capacity, 1);
        let mut batch_number = 0;

        while let Some(document) = documents.next() {
            batch.push(document);
            if !batch.is_full() {
                continue;
            }

            batch_number += 1;
            let next_position = batch.last_position() + 1;
            let full = std::mem::replace(&mut batch, Batch::new(capacity, next_position));
            self.submit_batch(collection, batch_number, full, &mut report)
                .await;

            if !pause.is_zero() && documents.peek().is_some() {
                tokio::time::sleep(pause).await;
            }
        }

        // Drain the partial batch
        if !batch.is_empty() {
            batch_number += 1;
            self.submit_batch(collection, batch_number, batch, &mut report)
                .await;
        }

        report
    }

    async fn submit_batch(
        &self,
        collection: &str,
        batch_number: usize,
        batch: Batch,
        report: &mut WriteReport,
    ) {
        let count = batch.documents.len();
        let unit = || {
            format!(
                "batch {} to {} (records {}-{}, {} documents)",
                batch_number,
                collection,
                batch.first_position,
                batch.last_position(),
                count
            )
        };

        match self.store.create_many(collection, &batch.documents).await {
            Ok(summary) if summary.created == count => {
                report.record_success(count);
                info!(
                    collection,
                    batch = batch_number,
                    documents = count,
                    "Batch written"
                );
            },
            Ok(summary) => {
                let written = summary.created.min(count);
                report.record_shortfall(written, count - written);
                let message = format!(
                    "Store acknowledged {} of {} documents for {}",
                    summary.created,
                    count,
                    unit()
                );
                warn!(collection, batch = batch_number, "{}", message);
                self.sink.append(message);
            },
            Err(e) => {
                report.record_failure(count);
                let message = IngestError::store_write(unit(), e).to_string();
                warn!(collection, batch = batch_number, "{}", message);
                self.sink.append(message);
            },
        }
    }

    async fn write_per_record<I>(&self, collection: &str, documents: I) -> WriteReport
    where
        I: IntoIterator<Item = EntityDocument>,
    {
        let limit = self.config.max_in_flight.max(1);
        let mut report = WriteReport::default();

        let mut outcomes = stream::iter(documents.into_iter().enumerate())
            .map(|(index, document)| async move {
                let result = self.store.create_one(collection, &document).await;
                (index + 1, document, result)
            })
            .buffer_unordered(limit);

        while let Some((position, document, result)) = outcomes.next().await {
            match result {
                Ok(id) => {
                    report.record_success(1);
                    debug!(collection, position, id = %id, "Document inserted");
                },
                Err(e) => {
                    report.record_failure(1);
                    self.log_record_failure(collection, position, &document, e);
                },
            }
        }

        report
    }

    fn log_record_failure(
        &self,
        collection: &str,
        position: usize,
        document: &EntityDocument,
        error: StoreError,
    ) {
        let content = document
            .to_json()
            .unwrap_or_else(|e| format!("<unserializable document: {}>", e));
        let unit = format!("record {} to {}", position, collection);
        let message = format!("{} - {}", IngestError::store_write(unit, error), content);
        warn!(collection, position, "{}", message);
        self.sink.append(message);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::{BatchSummary, DocumentId};
    use async_trait::async_trait;
    use flightload_common::FieldValue;
    use std::sync::Mutex;

    /// Records call sizes; fails the calls whose 1-based index is listed
    #[derive(Default)]
    struct CountingStore {
        calls: Mutex<Vec<usize>>,
        fail_calls: Vec<usize>,
        /// Documents silently dropped from every batch
        short_by: usize,
    }

    impl CountingStore {
        fn failing(fail_calls: Vec<usize>) -> Self {
            Self {
                fail_calls,
                ..Self::default()
            }
        }

        fn short_by(short_by: usize) -> Self {
            Self {
                short_by,
                ..Self::default()
            }
        }

        fn record(&self, size: usize) -> Result<(), StoreError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(size);
            if self.fail_calls.contains(&calls.len()) {
                Err(StoreError::rejected(500, "forced failure"))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        async fn create_one(&self, _: &str, _: &EntityDocument) -> Result<DocumentId, StoreError> {
            self.record(1)?;
            Ok(DocumentId("1".to_string()))
        }

        async fn create_many(
            &self,
            _: &str,
            documents: &[EntityDocument],
        ) -> Result<BatchSummary, StoreError> {
            self.record(documents.len())?;
            Ok(BatchSummary {
                created: documents.len().saturating_sub(self.short_by),
            })
        }
    }

    fn documents(n: usize) -> Vec<EntityDocument> {
        (0..n)
            .map(|i| {
                let mut doc = EntityDocument::new();
                doc.insert("id", FieldValue::Integer(i as i64));
                doc
            })
            .collect()
    }

    fn batched(batch_size: usize) -> WriterConfig {
        WriterConfig {
            mode: WriteMode::Batched,
            batch_size,
            batch_pause_ms: 0,
            ..WriterConfig::default()
        }
    }

    #[tokio::test]
    async fn test_batch_sizes_follow_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ErrorSink::new(dir.path().join("errors.log"));

        for (n, expected) in [
            (0usize, vec![]),
            (1, vec![1]),
            (10, vec![10]),
            (11, vec![10, 1]),
            (30, vec![10, 10, 10]),
        ] {
            let store = CountingStore::default();
            let writer = BatchWriter::new(&store, &sink, batched(10));
            let report = writer.write_all("Airline", documents(n)).await;

            assert_eq!(store.calls(), expected, "n = {n}");
            assert_eq!(report.units_attempted, n.div_ceil(10));
            assert_eq!(report.documents_written, n);
        }
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_stream() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("errors.log");
        let sink = ErrorSink::new(&log);
        let store = CountingStore::failing(vec![1]);

        let writer = BatchWriter::new(&store, &sink, batched(4));
        let report = writer.write_all("Route", documents(10)).await;

        assert_eq!(store.calls(), vec![4, 4, 2]);
        assert_eq!(report.units_failed, 1);
        assert_eq!(report.documents_failed, 4);
        assert_eq!(report.documents_written, 6);

        sink.flush();
        let contents = std::fs::read_to_string(&log).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("Failed to write batch 1 to Route (records 1-4, 4 documents)"));
        assert!(contents.contains("forced failure"));
    }

    #[tokio::test]
    async fn test_short_acknowledgement_is_counted_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("errors.log");
        let sink = ErrorSink::new(&log);
        let store = CountingStore::short_by(1);

        let writer = BatchWriter::new(&store, &sink, batched(4));
        let report = writer.write_all("Airline", documents(6)).await;

        assert_eq!(store.calls(), vec![4, 2]);
        assert_eq!(report.units_attempted, 2);
        assert_eq!(report.units_failed, 0);
        assert_eq!(report.documents_written, 4);
        assert_eq!(report.documents_failed, 2);

        sink.flush();
        let contents = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0]
            .contains("Store acknowledged 3 of 4 documents for batch 1 to Airline (records 1-4"));
        assert!(lines[1].contains("acknowledged 1 of 2 documents for batch 2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_full_batches_only() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ErrorSink::new(dir.path().join("errors.log"));
        let store = CountingStore::default();
        let config = WriterConfig {
            batch_pause_ms: 1000,
            ..batched(10)
        };

        let start = tokio::time::Instant::now();
        let writer = BatchWriter::new(&store, &sink, config);
        writer.write_all("Airport", documents(25)).await;

        // Two full batches each followed by more input; the final partial batch is not
        assert_eq!(start.elapsed(), std::time::Duration::from_millis(2000));
        assert_eq!(store.calls(), vec![10, 10, 5]);
    }

    #[tokio::test]
    async fn test_per_record_mode_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("errors.log");
        let sink = ErrorSink::new(&log);
        let store = CountingStore::failing(vec![3]);
        let config = WriterConfig {
            mode: WriteMode::PerRecord,
            max_in_flight: 4,
            ..WriterConfig::default()
        };

        let writer = BatchWriter::new(&store, &sink, config);
        let report = writer.write_all("Country", documents(6)).await;

        assert_eq!(store.calls().len(), 6);
        assert_eq!(report.units_attempted, 6);
        assert_eq!(report.units_failed, 1);
        assert_eq!(report.documents_written, 5);

        sink.flush();
        let contents = std::fs::read_to_string(&log).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("to Country"));
        assert!(contents.contains("{\"id\":"));
    }
}
