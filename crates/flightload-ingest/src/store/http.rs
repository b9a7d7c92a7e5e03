//! HTTP document store client

use async_trait::async_trait;
use flightload_common::EntityDocument;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{BatchSummary, DocumentId, DocumentStore};
use crate::error::StoreError;

/// Connection settings for [`HttpDocumentStore`]
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL, e.g. `https://store.example.com/v1`
    pub base_url: String,
    /// Bearer secret sent with every request
    pub secret: Option<String>,
    /// Per-request deadline
    pub timeout: Duration,
}

/// Document store reached over a JSON/HTTP API
///
/// - `POST {base}/collections/{collection}/documents` creates one document
/// - `POST {base}/collections/{collection}/documents/batch` creates many
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
    secret: Option<String>,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    documents: &'a [EntityDocument],
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: serde_json::Value,
}

#[derive(Deserialize)]
struct ErrorResponse {
    summary: Option<String>,
    error: Option<String>,
}

impl HttpDocumentStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret: config.secret,
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!("{}/collections/{}/documents", self.base_url, collection)
    }

    async fn post<B, T>(&self, url: &str, body: &B) -> Result<T, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(url).json(body);
        if let Some(ref secret) = self.secret {
            request = request.bearer_auth(secret);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(url, status = status.as_u16(), "Store responded");

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::rejected(status.as_u16(), error_summary(&body)))
    }
}

/// Pull the most useful detail out of an error body
fn error_summary(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        if let Some(detail) = parsed.summary.or(parsed.error) {
            return detail;
        }
    }

    let body = body.trim();
    if body.is_empty() {
        "no detail provided".to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn create_one(
        &self,
        collection: &str,
        document: &EntityDocument,
    ) -> Result<DocumentId, StoreError> {
        let created: CreatedResponse = self.post(&self.documents_url(collection), document).await?;

        let id = match created.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(DocumentId(id))
    }

    async fn create_many(
        &self,
        collection: &str,
        documents: &[EntityDocument],
    ) -> Result<BatchSummary, StoreError> {
        let url = format!("{}/batch", self.documents_url(collection));
        self.post(&url, &BatchRequest { documents }).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_summary_prefers_summary_field() {
        assert_eq!(
            error_summary(r#"{"summary": "invalid reference", "error": "bad"}"#),
            "invalid reference"
        );
        assert_eq!(error_summary(r#"{"error": "constraint_failure"}"#), "constraint_failure");
        assert_eq!(error_summary("gateway timeout"), "gateway timeout");
        assert_eq!(error_summary("  "), "no detail provided");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let store = HttpDocumentStore::new(HttpStoreConfig {
            base_url: "http://localhost:8443/".to_string(),
            secret: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        assert_eq!(
            store.documents_url("Airline"),
            "http://localhost:8443/collections/Airline/documents"
        );
    }
}
