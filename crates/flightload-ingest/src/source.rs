//! Record Source: positional flat-file reader
//!
//! Wraps a `csv` reader configured for headerless input and assigns field
//! names from the entity schema. The source is a one-pass iterator: once a read
//! error has been yielded it is exhausted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{IngestError, Result};

/// One input line with schema field names attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    line: u64,
    fields: Vec<(&'static str, String)>,
}

impl RawRecord {
    pub fn new(line: u64, fields: Vec<(&'static str, String)>) -> Self {
        Self { line, fields }
    }

    /// 1-based line number in the source file
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The row as it would be written back, for error messages
    pub fn to_line(&self) -> String {
        self.fields
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Lazy, ordered sequence of [`RawRecord`]s read from a delimited file
pub struct RecordSource<R: Read> {
    label: String,
    schema: &'static [&'static str],
    reader: csv::Reader<R>,
    buffer: csv::StringRecord,
    finished: bool,
}

impl RecordSource<File> {
    /// Open `path` for reading with the given positional schema
    pub fn open(path: impl AsRef<Path>, schema: &'static [&'static str]) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| IngestError::source_read(path.display().to_string(), e))?;
        Ok(Self::from_reader(file, schema, path.display().to_string()))
    }
}

impl<R: Read> RecordSource<R> {
    /// Build a source over any reader; `label` names it in errors
    pub fn from_reader(
        reader: R,
        schema: &'static [&'static str],
        label: impl Into<String>,
    ) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        Self {
            label: label.into(),
            schema,
            reader,
            buffer: csv::StringRecord::new(),
            finished: false,
        }
    }

    fn to_raw(&self) -> RawRecord {
        let line = self
            .buffer
            .position()
            .map(|p| p.line())
            .unwrap_or_default();

        // Extra trailing columns are ignored; missing ones stay out of the record
        let fields = self
            .schema
            .iter()
            .zip(self.buffer.iter())
            .map(|(name, value)| (*name, value.to_string()))
            .collect();

        RawRecord::new(line, fields)
    }
}

impl<R: Read> Iterator for RecordSource<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.reader.read_record(&mut self.buffer) {
            Ok(true) => Some(Ok(self.to_raw())),
            Ok(false) => {
                self.finished = true;
                None
            },
            Err(e) => {
                self.finished = true;
                Some(Err(IngestError::source_read(self.label.clone(), e)))
            },
        }
    }
}

impl<R: Read> std::iter::FusedIterator for RecordSource<R> {}
