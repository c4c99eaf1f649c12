//! Query Client
//!
//! Asks the backend about an indexed page. Degraded but valid outcomes
//! (method not allowed, empty reply) come back as sentinel strings; only a
//! round trip that never completed is an error.

use super::transport::{Endpoint, Transport};
use crate::error::SessionError;
use crate::storage::FingerprintCache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const METHOD_NOT_ALLOWED_REPLY: &str =
    "SYSTEM_ERROR: Method Not Allowed. Check server configuration.";
pub const EMPTY_REPLY: &str = "NEURAL_LINK_FAILED: No response content.";

const STATUS_METHOD_NOT_ALLOWED: u16 = 405;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    url: &'a str,
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    reply: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// Cleaned backend reply; the only cacheable outcome
    Answer(String),
    /// Fixed display text for a recoverable backend condition
    Sentinel(&'static str),
}

impl ChatReply {
    pub fn into_text(self) -> String {
        match self {
            ChatReply::Answer(text) => text,
            ChatReply::Sentinel(text) => text.to_string(),
        }
    }
}

/// Strip every `*` and the surrounding whitespace.
pub fn clean_reply(reply: &str) -> String {
    reply.replace('*', "").trim().to_string()
}

#[derive(Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn lookup(cache: &FingerprintCache, page_id: &str, question: &str) -> Option<String> {
        let cached = cache.get_answer(page_id, question)?;
        tracing::info!("[QueryClient] CACHE_HIT: returning cached answer for '{}'", page_id);
        Some(cached.to_string())
    }

    /// One network call, no cache involvement.
    pub async fn fetch(&self, page_id: &str, question: &str) -> Result<ChatReply, SessionError> {
        let payload = serde_json::to_value(ChatRequest {
            url: page_id,
            query: question,
        })
        .map_err(|_| SessionError::CommunicationTimeout)?;

        let response = self
            .transport
            .post(Endpoint::Chat, payload)
            .await
            .map_err(|e| {
                tracing::error!("[QueryClient] NETWORK_FAILURE: {}", e);
                SessionError::CommunicationTimeout
            })?;

        if response.status == STATUS_METHOD_NOT_ALLOWED {
            tracing::warn!("[QueryClient] Backend answered 405 for {}", Endpoint::Chat);
            return Ok(ChatReply::Sentinel(METHOD_NOT_ALLOWED_REPLY));
        }

        if !response.is_success() {
            tracing::warn!(
                "[QueryClient] Backend returned error status {}: {}",
                response.status,
                response.body
            );
            return Err(SessionError::CommunicationTimeout);
        }

        let parsed: ChatResponse = serde_json::from_str(&response.body).map_err(|e| {
            tracing::warn!("[QueryClient] Failed to decode response body: {}", e);
            SessionError::CommunicationTimeout
        })?;

        match parsed.reply.filter(|r| !r.is_empty()) {
            Some(reply) => Ok(ChatReply::Answer(clean_reply(&reply))),
            None => {
                tracing::warn!("[QueryClient] Response carried no reply");
                Ok(ChatReply::Sentinel(EMPTY_REPLY))
            }
        }
    }

    /// Sentinels are never cached so a retried question can still succeed.
    pub fn record(cache: &mut FingerprintCache, page_id: &str, question: &str, reply: &ChatReply) {
        if let ChatReply::Answer(answer) = reply {
            cache.put_answer(page_id, question, answer.clone());
        }
    }

    pub async fn chat(
        &self,
        cache: &mut FingerprintCache,
        page_id: &str,
        question: &str,
    ) -> Result<String, SessionError> {
        if let Some(cached) = Self::lookup(cache, page_id, question) {
            return Ok(cached);
        }

        let reply = self.fetch(page_id, question).await?;
        Self::record(cache, page_id, question, &reply);
        Ok(reply.into_text())
    }
}
