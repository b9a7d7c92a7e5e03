//! Error Sink: append-only, timestamped failure log
//!
//! Each entry is one line, `[<ISO-8601 timestamp>] <message>`. Appending never
//! fails from the caller's point of view: if the log cannot be written the
//! problem is reported through `tracing` and swallowed.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::error;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};

use crate::error::IngestError;

const SINK_TARGET: &str = "flightload::error_sink";

/// Shared append-only error log
///
/// Lines are handed to a background writer thread, so `append` only formats
/// and enqueues. Call [`ErrorSink::flush`] (or drop the sink) before reading
/// the file back.
pub struct ErrorSink {
    path: PathBuf,
    state: Mutex<SinkState>,
    entries: AtomicUsize,
}

enum SinkState {
    Closed,
    Open {
        writer: NonBlocking,
        _guard: WorkerGuard,
    },
    Failed,
}

impl ErrorSink {
    /// The file is opened (and created) on the first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(SinkState::Closed),
            entries: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries handed to the writer by this sink
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }

    /// Record a failure; never propagates log errors
    pub fn append(&self, message: impl AsRef<str>) {
        let line = format_entry(Utc::now(), message.as_ref());

        match self.enqueue(&line) {
            Ok(()) => {
                self.entries.fetch_add(1, Ordering::Relaxed);
            },
            Err(e) => {
                error!(
                    target: SINK_TARGET,
                    path = %self.path.display(),
                    error = %e,
                    entry = %line.trim_end(),
                    "Failed to write to error log"
                );
            },
        }
    }

    /// Wait for queued entries to reach the file
    ///
    /// The next append reopens the log in append mode.
    pub fn flush(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(*state, SinkState::Open { .. }) {
            // Dropping the guard drains the queue and joins the writer thread
            *state = SinkState::Closed;
        }
    }

    fn enqueue(&self, line: &str) -> Result<(), IngestError> {
        let mut writer = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if matches!(*state, SinkState::Closed) {
                match self.open() {
                    Ok(open) => *state = open,
                    Err(e) => {
                        *state = SinkState::Failed;
                        return Err(e);
                    },
                }
            }
            match &*state {
                SinkState::Open { writer, .. } => writer.clone(),
                _ => {
                    return Err(IngestError::LogSink(io::Error::new(
                        io::ErrorKind::NotConnected,
                        "error log could not be opened",
                    )))
                },
            }
        };

        // One write per line so concurrent appends never interleave
        writer.write_all(line.as_bytes()).map_err(IngestError::LogSink)
    }

    fn open(&self) -> Result<SinkState, IngestError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(IngestError::LogSink)?;

        let (writer, guard) = NonBlockingBuilder::default()
            .lossy(false)
            .thread_name("flightload-error-sink")
            .finish(ReportingFile {
                path: self.path.clone(),
                file,
            });

        Ok(SinkState::Open {
            writer,
            _guard: guard,
        })
    }
}

/// Log file handle that reports write failures from the writer thread
struct ReportingFile {
    path: PathBuf,
    file: File,
}

impl Write for ReportingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf).inspect_err(|e| {
            error!(
                target: SINK_TARGET,
                path = %self.path.display(),
                error = %e,
                entry = %String::from_utf8_lossy(buf).trim_end(),
                "Failed to write to error log"
            );
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Render one log line, newline included
pub fn format_entry(timestamp: DateTime<Utc>, message: &str) -> String {
    let message: String = message
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    format!(
        "[{}] {}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        message
    )
}
