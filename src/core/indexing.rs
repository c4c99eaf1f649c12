//! Indexing Client
//!
//! Submits a page's text to the backend once per page identifier. The cache
//! lookup, the network submission and the cache update are separate steps so
//! the session actor can run the submission off its own task.

use super::transport::{Endpoint, Transport};
use crate::error::{SessionError, INDEXING_FAILED};
use crate::storage::FingerprintCache;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct IndexRequest<'a> {
    url: &'a str,
    text: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexOutcome {
    /// Cache hit, no request was made
    AlreadyIndexed,
    /// Backend acknowledgment payload
    Indexed(Value),
}

#[derive(Clone)]
pub struct IndexingClient {
    transport: Arc<dyn Transport>,
}

impl IndexingClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn lookup(cache: &FingerprintCache, page_id: &str) -> Option<IndexOutcome> {
        if cache.has_indexed(page_id) {
            tracing::info!("[IndexingClient] CACHE_HIT: '{}' already indexed", page_id);
            Some(IndexOutcome::AlreadyIndexed)
        } else {
            None
        }
    }

    /// One network submission, no cache involvement and no retry.
    pub async fn submit(&self, page_id: &str, text: &str) -> Result<Value, SessionError> {
        let payload = serde_json::to_value(IndexRequest { url: page_id, text })
            .map_err(|e| SessionError::indexing_failed(e.to_string()))?;

        let response = self
            .transport
            .post(Endpoint::Index, payload)
            .await
            .map_err(|e| {
                tracing::error!("[IndexingClient] Transport failure for '{}': {}", page_id, e);
                SessionError::indexing_failed(INDEXING_FAILED)
            })?;

        let body = response.json().ok();

        if !response.is_success() {
            let detail = body
                .as_ref()
                .and_then(|b| b.get("detail"))
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
                .unwrap_or(INDEXING_FAILED)
                .to_string();
            tracing::error!(
                "[IndexingClient] Backend rejected '{}' with status {}: {}",
                page_id,
                response.status,
                detail
            );
            return Err(SessionError::IndexingFailed(detail));
        }

        body.ok_or_else(|| {
            tracing::error!("[IndexingClient] Unreadable acknowledgment for '{}'", page_id);
            SessionError::indexing_failed(INDEXING_FAILED)
        })
    }

    pub fn record(cache: &mut FingerprintCache, page_id: &str) {
        cache.mark_indexed(page_id);
    }

    pub async fn index_page(
        &self,
        cache: &mut FingerprintCache,
        page_id: &str,
        text: &str,
    ) -> Result<IndexOutcome, SessionError> {
        if let Some(outcome) = Self::lookup(cache, page_id) {
            return Ok(outcome);
        }

        let ack = self.submit(page_id, text).await?;
        Self::record(cache, page_id);
        tracing::info!("[IndexingClient] Indexed '{}'", page_id);
        Ok(IndexOutcome::Indexed(ack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::core::transport::HttpTransport;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = "https://x.test/a";

    fn client_for(server: &MockServer) -> IndexingClient {
        let transport = HttpTransport::new(&Settings::for_backend(server.uri())).unwrap();
        IndexingClient::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn test_second_index_is_cache_hit() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/index"))
            .and(body_json(json!({"url": PAGE, "text": "page body"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let mut cache = FingerprintCache::new();

        let first = client.index_page(&mut cache, PAGE, "page body").await.unwrap();
        assert_eq!(first, IndexOutcome::Indexed(json!({"status": "success"})));
        assert!(cache.has_indexed(PAGE));

        let second = client.index_page(&mut cache, PAGE, "page body").await.unwrap();
        assert_eq!(second, IndexOutcome::AlreadyIndexed);
    }

    #[tokio::test]
    async fn test_backend_detail_is_surfaced() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/index"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "embedding quota"})))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let mut cache = FingerprintCache::new();

        let err = client.index_page(&mut cache, PAGE, "text").await.unwrap_err();
        assert_eq!(err, SessionError::IndexingFailed("embedding quota".to_string()));
        assert!(!cache.has_indexed(PAGE));
    }

    #[tokio::test]
    async fn test_error_without_detail_uses_generic_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/index"))
            .respond_with(ResponseTemplate::new(422).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let mut cache = FingerprintCache::new();

        let err = client.index_page(&mut cache, PAGE, "text").await.unwrap_err();
        assert_eq!(err, SessionError::indexing_failed(INDEXING_FAILED));
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_page_unindexed() {
        let transport = HttpTransport::new(&Settings::for_backend("http://127.0.0.1:9")).unwrap();
        let client = IndexingClient::new(Arc::new(transport));
        let mut cache = FingerprintCache::new();

        let err = client.index_page(&mut cache, PAGE, "text").await.unwrap_err();
        assert_eq!(err, SessionError::indexing_failed(INDEXING_FAILED));
        assert!(!cache.has_indexed(PAGE));
    }

    #[tokio::test]
    async fn test_retry_after_failure_hits_network_again() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/index"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "down"})))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/index"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let mut cache = FingerprintCache::new();

        assert!(client.index_page(&mut cache, PAGE, "text").await.is_err());
        assert!(client.index_page(&mut cache, PAGE, "text").await.is_ok());
        assert!(cache.has_indexed(PAGE));
    }
}
