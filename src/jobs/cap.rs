//! Leaderboard aggregation job
//!
//! Sums the per-entry cap counts across every page of the leaderboard and
//! writes the grand total into column B of today's row. The endpoint is
//! rate-sensitive and sits behind bot protection, so all fetches go through
//! the browser transport under the scheduler's concurrency cap.

use crate::config::Config;
use crate::infrastructure::transport::Transport;
use crate::jobs::verify_proxy;
use crate::orchestrator::run_aggregation;
use crate::services::sheets::{today_key, MetricsSink};
use crate::utils::retry::with_retries;
use anyhow::Result;
use serde_json::json;
use std::time::Duration;
use tracing::info;

const WORKSHEET: &str = "Cap";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub async fn run(
    transport: &dyn Transport,
    sink: &dyn MetricsSink,
    config: &Config,
) -> Result<()> {
    let date_key = today_key(DATE_FORMAT);
    let slot = sink.find_or_create_row(WORKSHEET, &date_key).await?;
    if slot.already_filled {
        info!("✅ row for {} already filled; nothing to do", date_key);
        return Ok(());
    }

    verify_proxy(transport, config).await?;

    let report = with_retries(
        "leaderboard aggregation",
        config.max_attempts,
        Duration::from_millis(config.retry_delay_ms),
        || async {
            run_aggregation(transport, config)
                .await
                .map_err(Into::into)
        },
    )
    .await?;

    if report.failed_pages.is_empty() {
        info!("✅ all {} pages processed", report.total_pages);
    }

    sink.write_cells(WORKSHEET, slot.row, &[(2, json!(report.grand_total))])
        .await?;
    info!(
        "✅ row {} updated with {} caps ({} pages)",
        slot.row, report.grand_total, report.processed_pages
    );
    Ok(())
}
