//! Chat notification service
//!
//! One-shot HTML message to a Telegram chat.

use crate::config::Config;
use crate::error::{AppError, AppResult, NotifyError};
use serde_json::json;
use tracing::info;

pub struct TelegramNotifier {
    http: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &Config) -> AppResult<Self> {
        let (token, chat_id) = config.require_telegram()?;
        Ok(Self {
            http: reqwest::Client::new(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    /// Send an HTML-formatted message
    pub async fn send_html(&self, message: &str) -> AppResult<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "HTML",
        });

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                AppError::Notify(NotifyError::SendFailed {
                    source: Box::new(e),
                })
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Notify(NotifyError::Rejected { status, body }));
        }

        info!("✅ chat message sent");
        Ok(())
    }
}
