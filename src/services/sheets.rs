//! Spreadsheet sink
//!
//! Every collector publishes into the same spreadsheet: one worksheet per
//! protocol, one row per day keyed by the date in column A, values in the
//! columns after it. Column B doubles as the "already collected today"
//! marker.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Row resolved (or created) for a date key
#[derive(Debug, Clone, Copy)]
pub struct RowSlot {
    /// 1-based row index
    pub row: usize,
    /// Column B already holds a value for this date
    pub already_filled: bool,
}

/// Date-keyed persistence sink
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Locate the row for `date_key` in column A, appending a new dated row
    /// when absent.
    async fn find_or_create_row(&self, worksheet: &str, date_key: &str) -> AppResult<RowSlot>;

    /// Write `(column, value)` cells into `row`
    async fn write_cells(&self, worksheet: &str, row: usize, cells: &[(u8, Value)])
        -> AppResult<()>;
}

/// Today's date key in the worksheet's format
pub fn today_key(format: &str) -> String {
    chrono::Local::now().format(format).to_string()
}

/// Google Sheets REST client
///
/// Token minting is outside this program; a ready bearer token arrives via
/// the environment.
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    token: String,
}

impl SheetsClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let (sheet_id, token) = config.require_sheet()?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.sheets_base_url.clone(),
            spreadsheet_id: sheet_id.to_string(),
            token: token.to_string(),
        })
    }

    async fn get_values(&self, range: &str) -> AppResult<Vec<Vec<String>>> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url, self.spreadsheet_id, range
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::sheet_request_failed(range, e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::sheet_bad_response(range, status, message));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::sheet_request_failed(range, e))?;

        // "values" is absent entirely for an empty range
        let rows = payload
            .get("values")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| {
                                cells
                                    .iter()
                                    .map(|c| c.as_str().unwrap_or_default().to_string())
                                    .collect()
                            })
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn update_values(&self, range: &str, values: Value) -> AppResult<()> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}?valueInputOption=USER_ENTERED",
            self.base_url, self.spreadsheet_id, range
        );
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::sheet_request_failed(range, e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::sheet_bad_response(range, status, message));
        }
        debug!("updated range {}", range);
        Ok(())
    }
}

#[async_trait]
impl MetricsSink for SheetsClient {
    async fn find_or_create_row(&self, worksheet: &str, date_key: &str) -> AppResult<RowSlot> {
        let col_a = self.get_values(&format!("{}!A:A", worksheet)).await?;
        let dates: Vec<String> = col_a
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect();

        if let Some(row) = locate_row(&dates, date_key) {
            let marker_range = format!("{}!B{}", worksheet, row);
            let marker = self.get_values(&marker_range).await?;
            let already_filled = marker
                .first()
                .and_then(|cells| cells.first())
                .map(|value| !value.is_empty())
                .unwrap_or(false);
            return Ok(RowSlot {
                row,
                already_filled,
            });
        }

        let row = dates.len() + 1;
        let range = format!("{}!A{}", worksheet, row);
        self.update_values(&range, json!([[date_key]])).await?;
        info!("📅 created row {} for {}", row, date_key);
        Ok(RowSlot {
            row,
            already_filled: false,
        })
    }

    async fn write_cells(
        &self,
        worksheet: &str,
        row: usize,
        cells: &[(u8, Value)],
    ) -> AppResult<()> {
        for (column, value) in cells {
            let range = format!("{}!{}{}", worksheet, col_letter(*column), row);
            self.update_values(&range, json!([[value]])).await?;
        }
        Ok(())
    }
}

/// 1-based row index of `date_key` in column A
fn locate_row(col_a: &[String], date_key: &str) -> Option<usize> {
    col_a
        .iter()
        .position(|value| value == date_key)
        .map(|idx| idx + 1)
}

/// Column letter for a 1-based column index (A..Z is all the sheet uses)
fn col_letter(column: u8) -> char {
    (b'A' + column - 1) as char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_existing_date_row() {
        let col_a = vec![
            "Date".to_string(),
            "01/08/2025".to_string(),
            "02/08/2025".to_string(),
        ];
        assert_eq!(locate_row(&col_a, "02/08/2025"), Some(3));
        assert_eq!(locate_row(&col_a, "03/08/2025"), None);
    }

    #[test]
    fn column_letters() {
        assert_eq!(col_letter(1), 'A');
        assert_eq!(col_letter(2), 'B');
        assert_eq!(col_letter(15), 'O');
    }
}
