//! Page extraction collaborator
//!
//! Produces the `(url, text)` pair the session indexes. Only whitespace
//! normalization happens here; readability heuristics live elsewhere.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s\s+").expect("whitespace pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPage {
    pub url: String,
    pub text: String,
}

impl ExtractedPage {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_empty() || self.text.trim().is_empty()
    }
}

/// Collapse whitespace runs to a single space and trim the ends.
pub fn normalize_text(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw, " ").trim().to_string()
}

#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(&self) -> Result<ExtractedPage>;
}

/// Reads page text saved to a local file, attributed to `url`.
pub struct FileExtractor {
    url: String,
    path: PathBuf,
}

impl FileExtractor {
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl PageExtractor for FileExtractor {
    async fn extract(&self) -> Result<ExtractedPage> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read page text from {}", self.path.display()))?;

        let text = normalize_text(&raw);
        tracing::debug!(
            "[FileExtractor] Extracted {} chars for '{}'",
            text.len(),
            self.url
        );
        Ok(ExtractedPage::new(self.url.clone(), text))
    }
}
