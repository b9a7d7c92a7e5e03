//! Error types for the ingest pipeline
//!
//! Every kind here is handled at the record or batch that caused it. Only
//! [`IngestError::SourceRead`] ends a stream early.

use thiserror::Error;

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Failures raised while ingesting one entity stream
#[derive(Error, Debug)]
pub enum IngestError {
    /// Input file missing, unreadable, or corrupted mid-stream
    #[error("Error reading the source file {path}: {message}")]
    SourceRead { path: String, message: String },

    /// Sanitization or rewriting failed for a single row
    #[error("Error processing row {line}: {raw} - {message}")]
    RowProcessing {
        line: u64,
        raw: String,
        message: String,
    },

    /// A record or batch could not be persisted; `unit` identifies which
    #[error("Failed to write {unit}: {source}")]
    StoreWrite {
        unit: String,
        #[source]
        source: StoreError,
    },

    /// The error log itself could not be written
    #[error("Failed to write to error log: {0}")]
    LogSink(#[source] std::io::Error),
}

impl IngestError {
    pub fn source_read(path: impl Into<String>, message: impl ToString) -> Self {
        Self::SourceRead {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn store_write(unit: impl Into<String>, source: StoreError) -> Self {
        Self::StoreWrite {
            unit: unit.into(),
            source,
        }
    }

    pub fn row_processing(line: u64, raw: impl Into<String>, message: impl ToString) -> Self {
        Self::RowProcessing {
            line,
            raw: raw.into(),
            message: message.to_string(),
        }
    }
}

/// Failures reported by a [`DocumentStore`](crate::store::DocumentStore)
#[derive(Error, Debug)]
pub enum StoreError {
    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered but refused the write; `summary` carries its detail
    #[error("store rejected the write ({status}): {summary}")]
    Rejected { status: u16, summary: String },

    /// The store response could not be understood
    #[error("unexpected store response: {0}")]
    Decode(String),

    #[error("store request timed out")]
    Timeout,
}

impl StoreError {
    pub fn rejected(status: u16, summary: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            summary: summary.into(),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}
