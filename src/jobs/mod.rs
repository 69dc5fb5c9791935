//! Collection jobs
//!
//! One module per protocol. Each job resolves (or creates) today's row,
//! bails out early when the row is already filled, collects its metrics
//! and writes them. The dispatcher owns the browser lifetime so it is
//! released on every exit path.

pub mod apy_report;
pub mod cap;
pub mod jupiter;
pub mod neutrl;
pub mod reservoir;
pub mod strata;

use crate::config::Config;
use crate::infrastructure::transport::{Transport, TransportSession};
use crate::infrastructure::{BrowserTransport, HttpTransport};
use crate::services::{SheetsClient, TelegramNotifier};
use crate::utils::logging::{log_startup, truncate_text};
use crate::utils::retry::with_retries;
use anyhow::Result;
use std::time::Duration;
use tracing::info;

/// Endpoint used to confirm the proxy tunnel before scraping
const IP_ECHO_URL: &str = "https://httpbin.org/ip";

/// Run the named job
pub async fn run_job(name: &str, config: &Config) -> Result<()> {
    log_startup(name, config.max_concurrent, config.batch_size);

    match name {
        "cap" => {
            let sink = SheetsClient::new(config)?;
            let transport = BrowserTransport::launch(config).await?;
            let result = cap::run(&transport, &sink, config).await;
            transport.shutdown().await;
            result
        }
        "jupiter" => {
            let sink = SheetsClient::new(config)?;
            let transport = BrowserTransport::launch(config).await?;
            let result = jupiter::run(&transport, &sink, config).await;
            transport.shutdown().await;
            result
        }
        "strata" => {
            let sink = SheetsClient::new(config)?;
            let transport = BrowserTransport::launch(config).await?;
            let result = strata::run(&transport, &sink, config).await;
            transport.shutdown().await;
            result
        }
        "neutrl" => {
            let sink = SheetsClient::new(config)?;
            let transport = BrowserTransport::launch(config).await?;
            let result = neutrl::run(&transport, &sink, config).await;
            transport.shutdown().await;
            result
        }
        "reservoir" => {
            let sink = SheetsClient::new(config)?;
            let transport = BrowserTransport::launch(config).await?;
            let result = reservoir::run(&transport, &sink, config).await;
            transport.shutdown().await;
            result
        }
        "apy-report" => {
            let notifier = TelegramNotifier::new(config)?;
            let browser = BrowserTransport::launch(config).await?;
            let http = HttpTransport::new();
            let result = apy_report::run(&browser, &http, &notifier, config).await;
            browser.shutdown().await;
            result
        }
        other => anyhow::bail!(
            "unknown job '{}' (expected cap, jupiter, strata, neutrl, reservoir or apy-report)",
            other
        ),
    }
}

/// Confirm the egress path works before hammering the target. Shares the
/// jobs' whole-step retry policy.
pub(crate) async fn verify_proxy(transport: &dyn Transport, config: &Config) -> Result<()> {
    let timeout = Duration::from_millis(config.page_timeout_ms);
    with_retries(
        "proxy check",
        config.max_attempts,
        Duration::from_millis(config.retry_delay_ms),
        || async {
            let session = transport.open_session().await?;
            let result = session.fetch(IP_ECHO_URL, timeout).await;
            session.close().await;
            let response = result?;
            info!("🌐 egress IP: {}", truncate_text(response.body.trim(), 200));
            Ok(())
        },
    )
    .await
}
