//! Backend Transport
//!
//! Information Hiding:
//! - HTTP client, base URL and headers hidden behind the `Transport` trait
//! - Callers see only the status code and the raw body text

use crate::config::Settings;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;

/// Backend routes used by the clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Index,
    Chat,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Index => "/index",
            Endpoint::Chat => "/chat",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Response as received, before any client-specific interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON payload. `Err` means no response was received at all.
    async fn post(&self, endpoint: Endpoint, payload: Value) -> Result<RawResponse, TransportError>;
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.backend.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: Endpoint, payload: Value) -> Result<RawResponse, TransportError> {
        let url = self.url(endpoint);
        tracing::debug!("[HttpTransport] POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!("[HttpTransport] {} responded with status {}", url, status);
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_post_sends_json_and_returns_raw_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"url": "u", "query": "q"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"reply\":\"hi\"}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(&Settings::for_backend(mock_server.uri())).unwrap();
        let response = transport
            .post(Endpoint::Chat, json!({"url": "u", "query": "q"}))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.json().unwrap()["reply"], "hi");
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/index"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let settings = Settings::for_backend(format!("{}/", mock_server.uri()));
        let transport = HttpTransport::new(&settings).unwrap();
        let response = transport.post(Endpoint::Index, json!({})).await.unwrap();

        assert_eq!(response.status, 500);
        assert!(!response.is_success());
        assert_eq!(response.body, "boom");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let transport = HttpTransport::new(&Settings::for_backend("http://127.0.0.1:9")).unwrap();
        let result = transport.post(Endpoint::Index, json!({})).await;
        assert!(result.is_err());
    }
}
