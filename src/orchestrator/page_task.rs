//! Per-page fetch with retry
//!
//! One extra attempt after a short delay, then the page is written off for
//! this run. Errors never propagate past this boundary; the scheduler only
//! ever sees an outcome.

use crate::services::decoder;
use crate::infrastructure::transport::TransportSession;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Final word on one page for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Success { page_sum: u64 },
    Failure { page: usize, reason: String },
}

/// Fetch and decode one page, retrying once on any failure.
///
/// Worst-case latency is bounded by two attempt timeouts plus the retry
/// delay. Safe to call repeatedly; it owns no shared state.
pub async fn fetch_page(
    session: &dyn TransportSession,
    endpoint: &str,
    sum_field: &str,
    page: usize,
    timeout: Duration,
    retry_delay: Duration,
) -> PageOutcome {
    match attempt_page(session, endpoint, sum_field, page, timeout).await {
        Ok(page_sum) => PageOutcome::Success { page_sum },
        Err(first_reason) => {
            debug!("page {}: first attempt failed ({}), retrying", page, first_reason);
            sleep(retry_delay).await;
            match attempt_page(session, endpoint, sum_field, page, timeout).await {
                Ok(page_sum) => PageOutcome::Success { page_sum },
                Err(reason) => PageOutcome::Failure { page, reason },
            }
        }
    }
}

async fn attempt_page(
    session: &dyn TransportSession,
    endpoint: &str,
    sum_field: &str,
    page: usize,
    timeout: Duration,
) -> Result<u64, String> {
    let url = format!("{}?page={}", endpoint, page);
    let response = session
        .fetch(&url, timeout)
        .await
        .map_err(|e| e.to_string())?;

    if !response.is_success() {
        return Err(format!("HTTP {}", response.status));
    }

    decoder::decode_page_sum(&response.body, sum_field).map_err(|e| e.to_string())
}
