//! Whole-step retry wrapper
//!
//! Fixed delay between attempts, no backoff, no jitter. Each job is a
//! single client hitting a single endpoint.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Run `op` up to `max_attempts` times, waiting `delay` between attempts.
///
/// The last error is surfaced verbatim once attempts are exhausted.
pub async fn with_retries<T, F, Fut>(
    label: &str,
    max_attempts: usize,
    delay: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;

    for attempt in 1..=max_attempts {
        info!("🔄 {}: attempt {}/{}", label, attempt, max_attempts);
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("❌ {}: attempt {} failed: {}", label, attempt, e);
                last_err = Some(e);
                if attempt < max_attempts {
                    info!("⏳ waiting {:?} before retry...", delay);
                    sleep(delay).await;
                } else {
                    warn!("🚫 {}: all attempts exhausted", label);
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{}: no attempts were made", label)))
}
