//! Transport capability
//!
//! One logical request per URL, answered with a status and a text body.
//! Sessions are reusable handles that execute requests strictly one at a
//! time; the scheduler owns them for the lifetime of one batch.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// One fetched page payload
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {ms}ms: {url}")]
    Timeout { url: String, ms: u64 },

    #[error("failed to open transport session: {0}")]
    Session(String),
}

/// A reusable request handle. One in-flight request at a time.
#[async_trait]
pub trait TransportSession: Send + Sync {
    /// Fetch a URL, bounding the whole attempt by `timeout`.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, TransportError>;

    /// Release the handle. Failures are logged, never propagated.
    async fn close(&self);
}

/// A source of transport sessions.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn TransportSession>, TransportError>;
}
