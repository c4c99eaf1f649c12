//! Fingerprint Cache
//!
//! Information Hiding:
//! - Set/map layout of indexed pages and cached answers hidden from clients
//! - Owned by exactly one session; no locking, no eviction
//! - Entries live until `reset`

use std::collections::{HashMap, HashSet};

/// Session-scoped record of indexed pages and answers per (page, question).
#[derive(Debug, Default, Clone)]
pub struct FingerprintCache {
    indexed: HashSet<String>,
    answers: HashMap<(String, String), String>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_indexed(&self, page_id: &str) -> bool {
        self.indexed.contains(page_id)
    }

    pub fn mark_indexed(&mut self, page_id: &str) {
        if self.indexed.insert(page_id.to_string()) {
            tracing::debug!("[FingerprintCache] Marked '{}' as indexed", page_id);
        }
    }

    /// Exact match on both parts of the key, case and whitespace included.
    pub fn get_answer(&self, page_id: &str, question: &str) -> Option<&str> {
        self.answers
            .get(&(page_id.to_string(), question.to_string()))
            .map(String::as_str)
    }

    /// First answer written for a key wins; later writes are ignored.
    pub fn put_answer(&mut self, page_id: &str, question: &str, answer: impl Into<String>) {
        self.answers
            .entry((page_id.to_string(), question.to_string()))
            .or_insert_with(|| answer.into());
    }

    pub fn reset(&mut self) {
        tracing::debug!(
            "[FingerprintCache] Clearing {} indexed pages and {} answers",
            self.indexed.len(),
            self.answers.len()
        );
        self.indexed.clear();
        self.answers.clear();
    }

    pub fn indexed_count(&self) -> usize {
        self.indexed.len()
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }
}
