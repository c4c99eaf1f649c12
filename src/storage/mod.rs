//! Session Storage
//!
//! Information Hiding:
//! - Cache structures owned by the session actor, never shared between sessions
//! - Clients receive the cache by reference for each call

pub mod fingerprint;

pub use fingerprint::FingerprintCache;
