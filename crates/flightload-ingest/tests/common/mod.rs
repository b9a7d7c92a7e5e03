//! Shared helpers for ingest integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use flightload_common::EntityDocument;
use flightload_ingest::store::{BatchSummary, DocumentId, DocumentStore};
use flightload_ingest::{ErrorSink, StoreError};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One call received by [`FlakyStore`]
#[derive(Debug, Clone)]
pub struct Call {
    pub collection: String,
    pub documents: Vec<serde_json::Value>,
}

/// Store that records every call and fails the listed (1-based) calls
#[derive(Default)]
pub struct FlakyStore {
    calls: Mutex<Vec<Call>>,
    fail_on: Vec<usize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(fail_on: &[usize]) -> Self {
        Self {
            calls: Mutex::default(),
            fail_on: fail_on.to_vec(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_sizes(&self) -> Vec<usize> {
        self.calls().iter().map(|c| c.documents.len()).collect()
    }

    fn record(&self, collection: &str, documents: &[EntityDocument]) -> Result<(), StoreError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Call {
            collection: collection.to_string(),
            documents: documents
                .iter()
                .map(|d| serde_json::to_value(d).unwrap())
                .collect(),
        });

        if self.fail_on.contains(&calls.len()) {
            Err(StoreError::rejected(
                400,
                format!("forced failure on call {}", calls.len()),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn create_one(
        &self,
        collection: &str,
        document: &EntityDocument,
    ) -> Result<DocumentId, StoreError> {
        self.record(collection, std::slice::from_ref(document))?;
        Ok(DocumentId(format!("{}", self.calls.lock().unwrap().len())))
    }

    async fn create_many(
        &self,
        collection: &str,
        documents: &[EntityDocument],
    ) -> Result<BatchSummary, StoreError> {
        self.record(collection, documents)?;
        Ok(BatchSummary {
            created: documents.len(),
        })
    }
}

/// Write `contents` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Lines of the sink's log once queued entries are written, empty when it was
/// never created
pub fn log_lines(sink: &ErrorSink) -> Vec<String> {
    sink.flush();
    std::fs::read_to_string(sink.path())
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

pub const COUNTRIES: &str = r#""Papua New Guinea","PG","PP"
"South Africa","ZA","SF"
"United States","US","US"
"Portugal","PT","PO"
"Russia","RU","RS"
"#;

pub const AIRLINES: &str = r#"1,"Private flight",\N,"-","N/A","","",N
2,"135 Airways",\N,"","GNL","GENERAL","United States","N"
3,"1Time Airline",\N,"1T","RNX","NEXTIME","South Africa","Y"
410,"Aerocondor",\N,"2B","ARD","AEROCONDOR","Portugal","Y"
"#;

pub const AIRPORTS: &str = r#"1,"Goroka Airport","Goroka","Papua New Guinea","GKA","AYGA",-6.081689834590001,145.391998291,5282,10,"U","Pacific/Port_Moresby","airport","OurAirports"
2965,"Sochi International Airport","Sochi","Russia","AER","URSS",43.449902,39.9566,89,3,"N","Europe/Moscow","airport","OurAirports"
2990,"Kazan International Airport","Kazan","Russia","KZN","UWKD",55.606201171875,49.278701782227,411,3,"N","Europe/Moscow","airport","OurAirports"
5000,"Unplaced Field","Nowhere","Russia",\N,\N,\N,12.5,0,\N,\N,\N,"airport","User"
"#;

pub const ROUTES: &str = "2B,410,AER,2965,KZN,2990,,0,CR2\n2B,410,KZN,2990,AER,2965,Y,0,CR2\n";
