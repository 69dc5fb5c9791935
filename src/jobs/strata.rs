//! Wallet points stats job
//!
//! The points API serves global and per-account totals for a season. Both
//! values are required; a partial response fails the attempt and falls to
//! the retry wrapper.

use crate::config::Config;
use crate::infrastructure::transport::{Transport, TransportSession};
use crate::jobs::verify_proxy;
use crate::services::decoder;
use crate::services::sheets::{today_key, MetricsSink};
use crate::utils::retry::with_retries;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

const WORKSHEET: &str = "Strata";
const DATE_FORMAT: &str = "%d/%m/%Y";
const STATS_URL: &str = "https://api.strata.money/points/stats";

pub async fn run(
    transport: &dyn Transport,
    sink: &dyn MetricsSink,
    config: &Config,
) -> Result<()> {
    let wallet = config.require_wallet()?.to_string();

    let date_key = today_key(DATE_FORMAT);
    let slot = sink.find_or_create_row(WORKSHEET, &date_key).await?;
    if slot.already_filled {
        info!("✅ row for {} already filled; nothing to do", date_key);
        return Ok(());
    }

    verify_proxy(transport, config).await?;

    let (global_points, account_points) = with_retries(
        "points stats fetch",
        config.max_attempts,
        Duration::from_millis(config.retry_delay_ms),
        || async {
            let session = transport.open_session().await?;
            let result = fetch_stats(session.as_ref(), &wallet, config).await;
            session.close().await;
            result
        },
    )
    .await?;

    sink.write_cells(
        WORKSHEET,
        slot.row,
        &[(2, json!(global_points)), (3, json!(account_points))],
    )
    .await?;
    info!(
        "✅ row {} updated: {} global, {} account",
        slot.row, global_points, account_points
    );
    Ok(())
}

async fn fetch_stats(
    session: &dyn TransportSession,
    wallet: &str,
    config: &Config,
) -> Result<(f64, f64)> {
    let url = format!(
        "{}?accountAddress={}&season=1&chainId=1",
        STATS_URL, wallet
    );
    let response = session
        .fetch(&url, Duration::from_millis(config.page_timeout_ms))
        .await?;
    if !response.is_success() {
        anyhow::bail!("HTTP {}", response.status);
    }

    let stats = decoder::parse_json(&response.body)?;
    let global_points = stats
        .pointer("/data/info/points")
        .and_then(Value::as_f64)
        .context("missing global points in stats response")?;
    let account_points = stats
        .pointer("/data/account/points/total")
        .and_then(Value::as_f64)
        .context("missing account points in stats response")?;

    info!(
        "📊 fetched stats: {} global, {} account",
        global_points, account_points
    );
    Ok((global_points, account_points))
}
