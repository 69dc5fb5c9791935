//! Leaderboard text stats job
//!
//! The leaderboard has no public API; the season totals are printed above
//! their labels in the rendered page. Both values must be found, otherwise
//! the attempt fails and the retry wrapper takes over.

use crate::config::Config;
use crate::infrastructure::BrowserTransport;
use crate::jobs::verify_proxy;
use crate::services::extract::integer_before_keyword;
use crate::services::sheets::{today_key, MetricsSink};
use crate::utils::logging::truncate_text;
use crate::utils::retry::with_retries;
use anyhow::{Context, Result};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const WORKSHEET: &str = "Reservoir";
const DATE_FORMAT: &str = "%d/%m/%Y";
const LEADERBOARD_URL: &str = "https://app.reservoir.xyz/leaderboard";
const LOOKBACK_LINES: usize = 10;

pub async fn run(
    browser: &BrowserTransport,
    sink: &dyn MetricsSink,
    config: &Config,
) -> Result<()> {
    let date_key = today_key(DATE_FORMAT);
    let slot = sink.find_or_create_row(WORKSHEET, &date_key).await?;
    if slot.already_filled {
        info!("✅ row for {} already filled; nothing to do", date_key);
        return Ok(());
    }

    verify_proxy(browser, config).await?;

    let (points, participants) = with_retries(
        "leaderboard page fetch",
        config.max_attempts,
        Duration::from_millis(config.retry_delay_ms),
        || async {
            let text = browser.fetch_rendered(LEADERBOARD_URL).await?;
            if config.verbose_logging {
                debug!("page text: {}", truncate_text(&text, 3000));
            }

            let points = integer_before_keyword(&text, "POINTS EARNED IN SEASON 2", LOOKBACK_LINES)
                .context("points total not found on page")?;
            let participants = integer_before_keyword(&text, "TOTAL PARTICIPANTS", LOOKBACK_LINES)
                .context("participant count not found on page")?;
            Ok((points, participants))
        },
    )
    .await?;

    sink.write_cells(
        WORKSHEET,
        slot.row,
        &[(2, json!(points)), (3, json!(participants))],
    )
    .await?;
    info!(
        "✅ row {} updated: {} points, {} participants",
        slot.row, points, participants
    );
    Ok(())
}
