//! Leaderboard page decoder
//!
//! A page payload is a JSON envelope with a `pagination.total` field (page
//! 1 only) and an `entries` array of records carrying the numeric field to
//! be summed. A missing envelope is fatal for the page; a single record
//! with a missing or garbled field contributes 0.

use crate::error::DecodeError;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Envelope {
    pagination: Option<Pagination>,
    entries: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total: Option<u64>,
}

/// Parse a payload body as JSON
pub fn parse_json(body: &str) -> Result<Value, DecodeError> {
    serde_json::from_str(body.trim()).map_err(|e| DecodeError::Malformed {
        source: Box::new(e),
    })
}

fn parse_envelope(body: &str) -> Result<Envelope, DecodeError> {
    serde_json::from_str(body.trim()).map_err(|e| DecodeError::Malformed {
        source: Box::new(e),
    })
}

/// Read `pagination.total` from the page-1 envelope, defaulting to 1 when
/// the field is absent.
pub fn decode_total_pages(body: &str) -> Result<usize, DecodeError> {
    let envelope = parse_envelope(body)?;
    let total = envelope
        .pagination
        .and_then(|pagination| pagination.total)
        .unwrap_or(1);
    Ok(total as usize)
}

/// Sum `sum_field` across all records of a page
pub fn decode_page_sum(body: &str, sum_field: &str) -> Result<u64, DecodeError> {
    let envelope = parse_envelope(body)?;
    let entries = envelope.entries.ok_or(DecodeError::MissingEntries)?;

    Ok(entries
        .iter()
        .map(|record| coerce_count(record.get(sum_field)))
        .sum())
}

/// Coerce a record field to a non-negative count. The upstream API is loose
/// about types: integers, floats and numeric strings all occur in the wild.
fn coerce_count(value: Option<&Value>) -> u64 {
    let Some(value) = value else { return 0 };
    if let Some(n) = value.as_u64() {
        return n;
    }
    if let Some(f) = value.as_f64() {
        return if f > 0.0 { f as u64 } else { 0 };
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.trim().parse::<u64>() {
            return n;
        }
        if let Ok(f) = s.trim().parse::<f64>() {
            return if f > 0.0 { f as u64 } else { 0 };
        }
    }
    0
}
