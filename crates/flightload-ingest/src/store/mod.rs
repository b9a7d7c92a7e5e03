//! Store contract consumed by the Batch Writer
//!
//! The pipeline only needs two operations: create one document, or create a
//! batch of documents in one call. Deferred references inside the documents are
//! resolved by the store; a reference that does not resolve is a store error.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use flightload_common::EntityDocument;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub use http::{HttpDocumentStore, HttpStoreConfig};
pub use memory::MemoryStore;

/// Identifier the store assigned to a created document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a successful batch write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub created: usize,
}

/// Document store client, constructed once per run and shared by reference
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_one(
        &self,
        collection: &str,
        document: &EntityDocument,
    ) -> Result<DocumentId, StoreError>;

    async fn create_many(
        &self,
        collection: &str,
        documents: &[EntityDocument],
    ) -> Result<BatchSummary, StoreError>;
}
