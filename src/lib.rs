//! Page Reader - cached request orchestration for chatting with a web page
//!
//! A session actor owns the fingerprint cache and the conversation log,
//! indexes each page once, caches answers per (page, question) and reveals
//! answers word by word.

pub mod actors;
pub mod config;
pub mod core;
pub mod error;
pub mod extract;
pub mod storage;
pub mod utils;

pub mod cli;

pub use actors::{Message, Role, SessionHandle, SessionView};
pub use config::Settings;
pub use crate::core::{ChatReply, IndexOutcome, IndexingClient, QueryClient};
pub use error::SessionError;
pub use extract::{ExtractedPage, FileExtractor, PageExtractor};
pub use storage::FingerprintCache;
