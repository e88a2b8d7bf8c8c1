// notifier/telegram.rs

use crate::model::{NotifyError, ScoredLot};
use crate::notifier::digest::format_digest;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TelegramNotifier {
    bot_token: String,
    chat_id: i64,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: i64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::ApiError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            bot_token,
            chat_id,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token)
    }

    /// Sends a plain text message.
    pub async fn notify_text(&self, text: &str) -> Result<(), NotifyError> {
        let request = self
            .client
            .post(self.endpoint())
            .form(&[("chat_id", self.chat_id.to_string()), ("text", text.to_string())])
            .send();

        let response = match timeout(SEND_TIMEOUT, request).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                warn!("❌ Telegram send() failed: {:?}", e);
                return Err(NotifyError::ApiError(format!("Send failed: {}", e)));
            }
            Err(_) => {
                warn!("⏳ Telegram send() timed out");
                return Err(NotifyError::Unreachable);
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "unknown".into());
        if !status.is_success() {
            warn!("❌ Telegram API responded [{}]: {}", status, body);
            return Err(NotifyError::ApiError(format!("status {}", status)));
        }
        info!("✅ Telegram response [{}]", status);
        Ok(())
    }

    /// Sends the digest of a ranked set.
    pub async fn notify_digest(&self, lots: &[ScoredLot], top_n: usize, days_ahead: i64) -> Result<(), NotifyError> {
        let message = format_digest(lots, top_n, days_ahead, Utc::now());
        info!("📤 Sending digest with {} ranked lots", lots.len().min(top_n));
        self.notify_text(&message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_embeds_bot_token() {
        let notifier = TelegramNotifier::new("123:abc".into(), 42).unwrap();
        assert_eq!(
            notifier.endpoint(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }
}
