use crate::error::{AppError, AppResult};

/// Program configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Concurrent page fetches within a chunk (also the per-batch worker count)
    pub max_concurrent: usize,
    /// Pages per batch; workers are torn down and reallocated between batches
    pub batch_size: usize,
    /// Per-page fetch timeout
    pub page_timeout_ms: u64,
    /// Timeout for the page-1 discovery probe
    pub discovery_timeout_ms: u64,
    /// Delay before the single per-page retry
    pub page_retry_delay_ms: u64,
    /// Whole-run attempts for each job step
    pub max_attempts: usize,
    /// Delay between whole-run attempts
    pub retry_delay_ms: u64,
    /// Failed-page ratio above which a run total is discarded
    pub max_failure_rate: f64,
    /// Paginated leaderboard endpoint (page number appended as ?page=N)
    pub leaderboard_url: String,
    /// Numeric field summed across leaderboard entries
    pub leaderboard_sum_field: String,
    /// Wait after navigation before reading rendered page text
    pub render_wait_ms: u64,
    /// Whether to log rendered-page previews
    pub verbose_logging: bool,
    // --- Spreadsheet sink ---
    pub sheet_id: Option<String>,
    pub sheets_token: Option<String>,
    pub sheets_base_url: String,
    // --- Outbound proxy for the browser ---
    pub proxy_http: Option<String>,
    // --- Chat notifications ---
    pub telegram_key: Option<String>,
    pub chat_id: Option<String>,
    // --- Wallet-scoped points queries ---
    pub wallet_address: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent: 6,
            batch_size: 18,
            page_timeout_ms: 20_000,
            discovery_timeout_ms: 30_000,
            page_retry_delay_ms: 1_000,
            max_attempts: 3,
            retry_delay_ms: 2_000,
            max_failure_rate: 0.10,
            leaderboard_url: "https://api.cap.app/v1/caps/leaderboard".to_string(),
            leaderboard_sum_field: "caps".to_string(),
            render_wait_ms: 5_000,
            verbose_logging: false,
            sheet_id: None,
            sheets_token: None,
            sheets_base_url: "https://sheets.googleapis.com/v4".to_string(),
            proxy_http: None,
            telegram_key: None,
            chat_id: None,
            wallet_address: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent: std::env::var("MAX_CONCURRENT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_size),
            page_timeout_ms: std::env::var("PAGE_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_timeout_ms),
            discovery_timeout_ms: std::env::var("DISCOVERY_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.discovery_timeout_ms),
            page_retry_delay_ms: std::env::var("PAGE_RETRY_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_retry_delay_ms),
            max_attempts: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_attempts),
            retry_delay_ms: std::env::var("RETRY_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_delay_ms),
            max_failure_rate: std::env::var("MAX_FAILURE_RATE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_failure_rate),
            leaderboard_url: std::env::var("LEADERBOARD_URL").unwrap_or(default.leaderboard_url),
            leaderboard_sum_field: std::env::var("LEADERBOARD_SUM_FIELD").unwrap_or(default.leaderboard_sum_field),
            render_wait_ms: std::env::var("RENDER_WAIT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.render_wait_ms),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            sheet_id: std::env::var("SHEET_ID").ok(),
            sheets_token: std::env::var("SHEETS_TOKEN").ok(),
            sheets_base_url: std::env::var("SHEETS_BASE_URL").unwrap_or(default.sheets_base_url),
            proxy_http: std::env::var("PROXY_HTTP").ok(),
            telegram_key: std::env::var("TELEGRAM_KEY").ok(),
            chat_id: std::env::var("CHAT_ID").ok(),
            wallet_address: std::env::var("Y_WALLET_ADD").ok(),
        }
    }

    /// Spreadsheet credentials, required by the sheet-writing jobs
    pub fn require_sheet(&self) -> AppResult<(&str, &str)> {
        let sheet_id = self
            .sheet_id
            .as_deref()
            .ok_or_else(|| AppError::missing_var("SHEET_ID"))?;
        let token = self
            .sheets_token
            .as_deref()
            .ok_or_else(|| AppError::missing_var("SHEETS_TOKEN"))?;
        Ok((sheet_id, token))
    }

    /// Chat credentials, required by the report job
    pub fn require_telegram(&self) -> AppResult<(&str, &str)> {
        let key = self
            .telegram_key
            .as_deref()
            .ok_or_else(|| AppError::missing_var("TELEGRAM_KEY"))?;
        let chat_id = self
            .chat_id
            .as_deref()
            .ok_or_else(|| AppError::missing_var("CHAT_ID"))?;
        Ok((key, chat_id))
    }

    /// Wallet address, required by the wallet-scoped points job
    pub fn require_wallet(&self) -> AppResult<&str> {
        self.wallet_address
            .as_deref()
            .ok_or_else(|| AppError::missing_var("Y_WALLET_ADD"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scraper_limits() {
        let config = Config::default();
        assert_eq!(config.max_concurrent, 6);
        assert_eq!(config.batch_size, 18);
        assert_eq!(config.max_attempts, 3);
        assert!((config.max_failure_rate - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn require_sheet_reports_missing_vars() {
        let config = Config::default();
        let err = config.require_sheet().unwrap_err();
        assert!(err.to_string().contains("SHEET_ID"));

        let config = Config {
            sheet_id: Some("abc123".to_string()),
            ..Config::default()
        };
        let err = config.require_sheet().unwrap_err();
        assert!(err.to_string().contains("SHEETS_TOKEN"));
    }
}
