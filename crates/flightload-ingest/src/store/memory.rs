//! In-process document store used for dry runs
//!
//! Documents are kept as JSON. With reference checking enabled, every deferred
//! reference must match an already stored document (`name` for name lookups,
//! `id` for id lookups) or the whole call is rejected, as a real store would.

use async_trait::async_trait;
use flightload_common::{EntityDocument, Lookup};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{BatchSummary, DocumentId, DocumentStore};
use crate::error::StoreError;

#[derive(Default)]
struct Collections {
    documents: HashMap<String, Vec<Value>>,
    next_id: u64,
}

/// Thread-safe in-memory [`DocumentStore`]
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
    check_references: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject documents whose references do not resolve
    pub fn with_reference_checks() -> Self {
        Self {
            inner: Mutex::default(),
            check_references: true,
        }
    }

    /// Snapshot of the documents stored in `collection`
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.lock()
            .documents
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.lock().documents.get(collection).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        // A poisoned lock only means another writer panicked mid-insert
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn resolve(state: &Collections, document: &EntityDocument) -> Result<(), StoreError> {
        for (field, reference) in document.references() {
            let key = serde_json::to_value(reference.key())
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            let lookup_field = match reference.lookup() {
                Lookup::ByName => "name",
                Lookup::ById => "id",
            };

            let found = state
                .documents
                .get(reference.collection())
                .is_some_and(|docs| docs.iter().any(|d| d.get(lookup_field) == Some(&key)));

            if !found {
                return Err(StoreError::rejected(
                    404,
                    format!("unresolved reference in `{}`: {}", field, reference),
                ));
            }
        }
        Ok(())
    }

    fn insert_all(
        &self,
        collection: &str,
        documents: &[EntityDocument],
    ) -> Result<Vec<DocumentId>, StoreError> {
        let values = documents
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let mut state = self.lock();
        if self.check_references {
            for document in documents {
                Self::resolve(&state, document)?;
            }
        }

        let mut ids = Vec::with_capacity(values.len());
        for value in values {
            state.next_id += 1;
            ids.push(DocumentId(state.next_id.to_string()));
            state
                .documents
                .entry(collection.to_string())
                .or_default()
                .push(value);
        }
        Ok(ids)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_one(
        &self,
        collection: &str,
        document: &EntityDocument,
    ) -> Result<DocumentId, StoreError> {
        let mut ids = self.insert_all(collection, std::slice::from_ref(document))?;
        ids.pop()
            .ok_or_else(|| StoreError::Decode("no document id assigned".to_string()))
    }

    async fn create_many(
        &self,
        collection: &str,
        documents: &[EntityDocument],
    ) -> Result<BatchSummary, StoreError> {
        let ids = self.insert_all(collection, documents)?;
        Ok(BatchSummary { created: ids.len() })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use flightload_common::{DeferredReference, FieldValue};

    fn country(name: &str) -> EntityDocument {
        let mut doc = EntityDocument::new();
        doc.insert("name", FieldValue::text(name));
        doc
    }

    fn airline(id: i64, country: &str) -> EntityDocument {
        let mut doc = EntityDocument::new();
        doc.insert("id", FieldValue::Integer(id));
        doc.insert(
            "country",
            DeferredReference::by_name("Country", FieldValue::text(country)),
        );
        doc
    }

    #[tokio::test]
    async fn test_create_one_assigns_ids() {
        let store = MemoryStore::new();
        let first = store.create_one("Country", &country("Iceland")).await.unwrap();
        let second = store.create_one("Country", &country("Norway")).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.count("Country"), 2);
    }

    #[tokio::test]
    async fn test_references_resolve_against_stored_documents() {
        let store = MemoryStore::with_reference_checks();
        store.create_one("Country", &country("Japan")).await.unwrap();

        assert!(store.create_one("Airline", &airline(324, "Japan")).await.is_ok());

        let err = store.create_one("Airline", &airline(325, "Atlantis")).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_batch_with_unresolved_reference_is_rejected_whole() {
        let store = MemoryStore::with_reference_checks();
        store.create_one("Country", &country("Japan")).await.unwrap();

        let batch = vec![airline(1, "Japan"), airline(2, "Atlantis"), airline(3, "Japan")];
        assert!(store.create_many("Airline", &batch).await.is_err());
        assert_eq!(store.count("Airline"), 0);
    }
}
