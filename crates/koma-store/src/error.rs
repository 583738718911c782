//! Error type for the persistence layer.
//!
//! Only recoverable I/O failures are errors here. Expected absence — no
//! saved page yet, no draft, project not found — is `Option`/`Ok(None)`
//! and never travels as an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed a request (network, auth, quota).
    #[error("backend request failed: {0}")]
    Backend(String),

    /// Browser-local storage failed (quota exceeded, unavailable).
    #[error("local storage failed: {0}")]
    Storage(String),

    /// Wire (JSON) serialization failed.
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Draft (MessagePack) encoding failed.
    #[error("draft encode failed: {0}")]
    DraftEncode(#[from] rmp_serde::encode::Error),

    /// Draft (MessagePack) decoding failed.
    #[error("draft decode failed: {0}")]
    DraftDecode(#[from] rmp_serde::decode::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
