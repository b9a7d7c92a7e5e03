//! Flightload Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Streams the airline, airport, country and route flat files into a document
//! store.
//!
//! # Pipeline
//!
//! - [`source`]: headerless delimited file → named raw records
//! - [`sanitize`]: trim, drop missing values, coerce numbers and yes-markers
//! - [`rewrite`]: foreign keys → deferred references, coordinates → `location`
//! - [`writer`]: batched or per-record submission with failure isolation
//! - [`sink`]: timestamped, append-only error log
//!
//! # Example
//!
//! ```no_run
//! use flightload_common::EntityKind;
//! use flightload_ingest::{ErrorSink, IngestConfig, MemoryStore, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let store = MemoryStore::new();
//!     let sink = ErrorSink::new(&config.error_log);
//!
//!     let report = Pipeline::from_config(&store, &sink, &config)
//!         .run_file(EntityKind::Country, config.input_path(EntityKind::Country))
//!         .await;
//!     tracing::info!(written = report.write.documents_written, "Countries loaded");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod rewrite;
pub mod sanitize;
pub mod sink;
pub mod source;
pub mod store;
pub mod writer;

pub use config::{IngestConfig, WriteMode, WriterConfig};
pub use error::{IngestError, Result, StoreError};
pub use pipeline::{IngestReport, Pipeline};
pub use sink::ErrorSink;
pub use source::{RawRecord, RecordSource};
pub use store::{DocumentStore, HttpDocumentStore, MemoryStore};
pub use writer::{BatchWriter, WriteReport};
