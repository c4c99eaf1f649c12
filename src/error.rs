//! Error types surfaced by the indexing and query clients and the session actor.

use thiserror::Error;

/// Generic detail used when the backend gives no usable reason for an indexing failure.
pub const INDEXING_FAILED: &str = "INDEXING_FAILED";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Backend rejected the page or the round trip never completed
    #[error("Indexing failed: {0}")]
    IndexingFailed(String),

    /// Chat round trip never completed
    #[error("COMMUNICATION_TIMEOUT")]
    CommunicationTimeout,

    /// Result arrived after the session it belonged to was reset
    #[error("Session was reset before the request completed")]
    SessionReset,

    /// Another page analysis is still running
    #[error("A page analysis is already in progress")]
    AnalysisInProgress,

    /// Extraction produced no url or no text
    #[error("Extracted page has no url or no text")]
    EmptyPage,

    /// The session actor is gone
    #[error("Session actor unavailable: {0}")]
    ActorUnavailable(String),
}

impl SessionError {
    pub fn indexing_failed(detail: impl Into<String>) -> Self {
        Self::IndexingFailed(detail.into())
    }
}

/// Failure below HTTP: connection refused, timeout, unreadable body.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_user_readable() {
        assert_eq!(
            SessionError::indexing_failed("bad page").to_string(),
            "Indexing failed: bad page"
        );
        assert_eq!(SessionError::CommunicationTimeout.to_string(), "COMMUNICATION_TIMEOUT");
    }
}
