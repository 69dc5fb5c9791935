//! Season program points job
//!
//! The rewards backend lists every season program with its running state;
//! only the mainnet program is tracked. Points and participant count both
//! arrive as strings and both must be present, otherwise the attempt fails
//! and the retry wrapper takes over.

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

const WORKSHEET: &str = "Neutrl";
const DATE_FORMAT: &str = "%d/%m/%Y";
const SEASON_STATS_URL: &str = "https://app.neutrl.fi/api/season-programs";
const PROGRAM_ID: &str = "ethereum-1";

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

    let (points, participants) = with_retries(
        "season stats fetch",
        config.max_attempts,
        Duration::from_millis(config.retry_delay_ms),
        || async {
            let session = transport.open_session().await?;
            let result = fetch_program_state(session.as_ref(), config).await;
            session.close().await;
            result
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

async fn fetch_program_state(
    session: &dyn TransportSession,
    config: &Config,
) -> Result<(f64, u64)> {
    let response = session
        .fetch(
            SEASON_STATS_URL,
            Duration::from_millis(config.page_timeout_ms),
        )
        .await?;
    if !response.is_success() {
        anyhow::bail!("HTTP {}", response.status);
    }

    let payload = decoder::parse_json(&response.body)?;
    let programs = payload
        .pointer("/data/seasonPrograms")
        .and_then(Value::as_array)
        .context("no season programs in response")?;

    let program = programs
        .iter()
        .find(|p| {
            p.get("id")
                .and_then(Value::as_str)
                .map(|id| id.contains(PROGRAM_ID))
                .unwrap_or(false)
        })
        .with_context(|| format!("program '{}' not found in response", PROGRAM_ID))?;

    let state = program.get("state").context("program has no state")?;
    // Both come over the wire as strings
    let points = number_field(state, "totalPoints").context("missing totalPoints")?;
    let participants = number_field(state, "participantCount")
        .context("missing participantCount")? as u64;

    info!(
        "📊 program {}: {} points, {} participants",
        PROGRAM_ID, points, participants
    );
    Ok((points, participants))
}

fn number_field(state: &Value, field: &str) -> Option<f64> {
    let value = state.get(field)?;
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    value.as_str()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_field_accepts_strings_and_numbers() {
        let state = json!({"totalPoints": "123456.5", "participantCount": 789});
        assert_eq!(number_field(&state, "totalPoints"), Some(123456.5));
        assert_eq!(number_field(&state, "participantCount"), Some(789.0));
        assert_eq!(number_field(&state, "absent"), None);
    }
}
