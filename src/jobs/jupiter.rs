//! Perps vault stats job
//!
//! The vault dashboard renders its numbers client-side next to asset
//! labels. Each labelled value lands in a fixed column; pool assets also
//! get their share of TVL in the adjacent ratio column.

use crate::config::Config;
use crate::infrastructure::BrowserTransport;
use crate::services::extract::{dollar_amount_above, first_number_after};
use crate::services::sheets::{today_key, MetricsSink};
use crate::utils::logging::truncate_text;
use crate::utils::retry::with_retries;
use anyhow::Result;
use phf::phf_map;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

const WORKSHEET: &str = "Jupiter";
const DATE_FORMAT: &str = "%d/%m/%Y";
const EARN_URL: &str = "https://jup.ag/perps-earn";

struct FieldSpec {
    column: u8,
    /// Column receiving this value's share of TVL
    ratio_column: Option<u8>,
    /// Candidate lines must start with this prefix
    prefix: Option<&'static str>,
}

/// Labelled dashboard fields and their worksheet columns
static FIELDS: phf::Map<&'static str, FieldSpec> = phf_map! {
    "Total Value Locked" => FieldSpec { column: 2, ratio_column: None, prefix: Some("$") },
    "Wrapped SOL" => FieldSpec { column: 3, ratio_column: Some(4), prefix: Some("$") },
    "Ether (Portal)" => FieldSpec { column: 5, ratio_column: Some(6), prefix: Some("$") },
    "Wrapped BTC (Portal)" => FieldSpec { column: 7, ratio_column: Some(8), prefix: Some("$") },
    "USD Coin" => FieldSpec { column: 9, ratio_column: Some(10), prefix: Some("$") },
    "Total Supply" => FieldSpec { column: 13, ratio_column: None, prefix: None },
    "JLP Price" => FieldSpec { column: 14, ratio_column: None, prefix: Some("$") },
};

/// The USDT pool value has no label of its own; it is printed above a bare
/// "<amount> USDT" balance line.
const USDT_COLUMN: u8 = 11;
const USDT_RATIO_COLUMN: u8 = 12;
const APR_COLUMN: u8 = 15;

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

    let text = with_retries(
        "vault page fetch",
        config.max_attempts,
        Duration::from_millis(config.retry_delay_ms),
        || async { browser.fetch_rendered(EARN_URL).await.map_err(Into::into) },
    )
    .await?;

    if config.verbose_logging {
        debug!("page text: {}", truncate_text(&text, 3000));
    }

    let cells = collect_cells(&text);
    sink.write_cells(WORKSHEET, slot.row, &cells).await?;
    info!("✅ row {} updated with {} cells", slot.row, cells.len());
    Ok(())
}

fn collect_cells(text: &str) -> Vec<(u8, Value)> {
    let tvl = first_number_after(text, "Total Value Locked", Some("$")).unwrap_or(0.0);

    let mut cells: Vec<(u8, Value)> = Vec::new();
    for (keyword, spec) in FIELDS.entries() {
        let value = first_number_after(text, keyword, spec.prefix).unwrap_or(0.0);
        cells.push((spec.column, json!(value)));
        if let Some(ratio_column) = spec.ratio_column {
            cells.push((ratio_column, json!(share_of(value, tvl))));
        }
    }

    let usdt = dollar_amount_above(text, "USDT").unwrap_or(0.0);
    cells.push((USDT_COLUMN, json!(usdt)));
    cells.push((USDT_RATIO_COLUMN, json!(share_of(usdt, tvl))));

    let apr_cell = match first_number_after(text, "APR", None) {
        Some(apr) => json!(format!("{}%", apr)),
        None => json!(""),
    };
    cells.push((APR_COLUMN, apr_cell));

    cells.sort_by_key(|(column, _)| *column);
    cells
}

fn share_of(value: f64, tvl: f64) -> f64 {
    if tvl > 0.0 {
        value / tvl
    } else {
        0.0
    }
}
