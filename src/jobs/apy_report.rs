//! Competitor APY report job
//!
//! Collects current yields across competing protocols and posts one
//! formatted message to the chat channel. Sources fail independently: a
//! dead endpoint shows up as ❌ in the report instead of sinking the whole
//! run.

use crate::config::Config;
use crate::infrastructure::transport::{Transport, TransportSession};
use crate::infrastructure::BrowserTransport;
use crate::services::extract::percent_near;
use crate::services::{decoder, TelegramNotifier};
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

const RESERVOIR_MINT_URL: &str =
    "https://app.reservoir.xyz/mint?from=rUSD&fromNetwork=Ethereum&to=srUSDv2&toNetwork=Ethereum";
const AVANT_SAVUSD_URL: &str = "https://app.avantprotocol.com/api/apy/savusd";
const AVANT_AVUSDX_URL: &str = "https://app.avantprotocol.com/api/apy/avusdx";
const MIDAS_APYS_URL: &str = "https://api-prod.midas.app/api/data/apys";
const YIELDFI_YUSD_URL: &str = "https://ctrl.yield.fi/t/apy/yusd/apyHistory";
const YIELDFI_VYUSD_URL: &str = "https://ctrl.yield.fi/t/apy/vyusd/apyHistory";
const INFINIFI_DATA_URL: &str = "https://eth-api.infinifi.xyz/api/protocol/data";
const INFINIFI_LOCK_URL: &str = "https://app.infinifi.xyz/lock";

const LOCK_WEEKS: [&str; 3] = ["1 week", "4 week", "8 week"];

/// One rate per tracked product; `None` renders as ❌
#[derive(Debug, Default)]
pub struct RateReport {
    pub reservoir_apy: Option<f64>,
    pub avant_savusd: Option<f64>,
    pub avant_avusdx: Option<f64>,
    pub mhyper: Option<f64>,
    pub yieldfi_yusd: Option<f64>,
    pub yieldfi_vyusd: Option<f64>,
    pub infinifi_siusd: Option<f64>,
    pub infinifi_liusd: [Option<f64>; 3],
}

pub async fn run(
    browser: &BrowserTransport,
    http: &dyn Transport,
    notifier: &TelegramNotifier,
    config: &Config,
) -> Result<()> {
    let timeout = Duration::from_millis(config.page_timeout_ms);

    let report = RateReport {
        reservoir_apy: scrape_reservoir_apy(browser).await,
        avant_savusd: json_rate(http, AVANT_SAVUSD_URL, timeout, |v| {
            v.get("apy").and_then(Value::as_f64)
        })
        .await,
        avant_avusdx: json_rate(http, AVANT_AVUSDX_URL, timeout, |v| {
            v.get("apy").and_then(Value::as_f64)
        })
        .await,
        mhyper: json_rate(http, MIDAS_APYS_URL, timeout, |v| {
            v.get("mhyper").and_then(Value::as_f64).map(|r| r * 100.0)
        })
        .await,
        yieldfi_yusd: json_rate(http, YIELDFI_YUSD_URL, timeout, |v| {
            v.pointer("/apy_history/0/apy").and_then(Value::as_f64)
        })
        .await,
        yieldfi_vyusd: json_rate(http, YIELDFI_VYUSD_URL, timeout, |v| {
            v.pointer("/apy_history/0/apy").and_then(Value::as_f64)
        })
        .await,
        infinifi_siusd: json_rate(browser, INFINIFI_DATA_URL, timeout, |v| {
            v.pointer("/data/staked/siUSD/average7dAPY")
                .and_then(Value::as_f64)
                .map(|r| r * 100.0)
        })
        .await,
        infinifi_liusd: scrape_lock_rates(browser).await,
    };

    let message = build_message(&report);
    notifier.send_html(&message).await?;
    info!("✅ rate report delivered");
    Ok(())
}

/// Fetch a JSON endpoint and pick one rate out of it, rounded to two
/// decimals. Any failure degrades to `None`.
async fn json_rate<F>(
    transport: &dyn Transport,
    url: &str,
    timeout: Duration,
    pick: F,
) -> Option<f64>
where
    F: Fn(&Value) -> Option<f64>,
{
    let result = async {
        let session = transport.open_session().await?;
        let fetched = session.fetch(url, timeout).await;
        session.close().await;
        fetched
    }
    .await;

    let rate = match result {
        Ok(response) if response.is_success() => decoder::parse_json(&response.body)
            .ok()
            .as_ref()
            .and_then(&pick),
        Ok(response) => {
            warn!("⚠️ {} returned HTTP {}", url, response.status);
            None
        }
        Err(e) => {
            warn!("⚠️ {} failed: {}", url, e);
            None
        }
    };
    rate.map(round2)
}

async fn scrape_reservoir_apy(browser: &BrowserTransport) -> Option<f64> {
    match browser.fetch_rendered(RESERVOIR_MINT_URL).await {
        Ok(text) => percent_near(&text, "Current APY").map(round2),
        Err(e) => {
            warn!("⚠️ mint page scrape failed: {}", e);
            None
        }
    }
}

async fn scrape_lock_rates(browser: &BrowserTransport) -> [Option<f64>; 3] {
    let text = match browser.fetch_rendered(INFINIFI_LOCK_URL).await {
        Ok(text) => text,
        Err(e) => {
            warn!("⚠️ lock page scrape failed: {}", e);
            return [None; 3];
        }
    };
    let mut rates = [None; 3];
    for (i, week) in LOCK_WEEKS.iter().enumerate() {
        rates[i] = percent_near(&text, week).map(round2);
    }
    rates
}

fn round2(rate: f64) -> f64 {
    (rate * 100.0).round() / 100.0
}

fn fmt_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{}%", rate),
        None => "❌%".to_string(),
    }
}

pub fn build_message(report: &RateReport) -> String {
    let mut lines = vec!["<b>Competitor Report 📊</b>\n".to_string()];

    lines.push("<u>Reservoir</u>".to_string());
    lines.push(format!("wsrUSD APY: {}\n", fmt_rate(report.reservoir_apy)));

    lines.push("<u>Avant</u>".to_string());
    lines.push(format!(
        "savUSD APY (Daily): {}",
        fmt_rate(report.avant_savusd)
    ));
    lines.push(format!(
        "avUSDx APY (Weekly): {}\n",
        fmt_rate(report.avant_avusdx)
    ));

    lines.push("<u>mHyper</u>".to_string());
    lines.push(format!("mHyper APY (7 Day): {}\n", fmt_rate(report.mhyper)));

    lines.push("<u>YieldFi</u>".to_string());
    lines.push(format!(
        "yUSD APY (7 Day): {}",
        fmt_rate(report.yieldfi_yusd)
    ));
    lines.push(format!(
        "vyUSD APY (7 Day): {}\n",
        fmt_rate(report.yieldfi_vyusd)
    ));

    lines.push("<u>Infinifi</u>".to_string());
    lines.push(format!("siUSD APY: {}", fmt_rate(report.infinifi_siusd)));
    for (i, week) in LOCK_WEEKS.iter().enumerate() {
        lines.push(format!(
            "liUSD {} APY: {}",
            capitalize_week(week),
            fmt_rate(report.infinifi_liusd[i])
        ));
    }

    lines.join("\n")
}

fn capitalize_week(week: &str) -> String {
    // "1 week" -> "1 Week"
    week.replace("week", "Week")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(4.216), 4.22);
        assert_eq!(round2(0.0449 * 100.0), 4.49);
    }

    #[test]
    fn message_includes_all_sections() {
        let report = RateReport {
            reservoir_apy: Some(4.21),
            avant_savusd: Some(6.0),
            mhyper: None,
            infinifi_liusd: [Some(1.1), None, Some(3.3)],
            ..RateReport::default()
        };
        let message = build_message(&report);

        assert!(message.starts_with("<b>Competitor Report 📊</b>"));
        assert!(message.contains("wsrUSD APY: 4.21%"));
        assert!(message.contains("savUSD APY (Daily): 6%"));
        assert!(message.contains("mHyper APY (7 Day): ❌%"));
        assert!(message.contains("liUSD 1 Week APY: 1.1%"));
        assert!(message.contains("liUSD 4 Week APY: ❌%"));
        assert!(message.contains("liUSD 8 Week APY: 3.3%"));
    }
}
