//! Plain HTTP transport
//!
//! For endpoints that serve JSON without bot protection. Conforms to the
//! same capability as the browser transport, so the two are swappable.

use crate::infrastructure::transport::{
    FetchResponse, Transport, TransportError, TransportSession,
};
use async_trait::async_trait;
use std::time::Duration;

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open_session(&self) -> Result<Box<dyn TransportSession>, TransportError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
        }))
    }
}

struct HttpSession {
    client: reqwest::Client,
}

#[async_trait]
impl TransportSession for HttpSession {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout {
                        url: url.to_string(),
                        ms: timeout.as_millis() as u64,
                    }
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(FetchResponse { status, body })
    }

    async fn close(&self) {}
}
