//! Telegram notification transport.
//!
//! Requires the `telegram` feature to be enabled.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::{ApiError, RequestError};
use tracing::debug;

use crate::error::DispatchError;
use crate::port::outbound::notifier::NotificationTransport;

/// Bot credentials and target chat.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token obtained from BotFather.
    pub bot_token: String,
    /// Target chat ID for notifications.
    pub chat_id: i64,
}

/// Sends plain-text messages to one chat.
pub struct TelegramTransport {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramTransport {
    #[must_use]
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(&config.bot_token),
            chat_id: ChatId(config.chat_id),
        }
    }
}

#[async_trait]
impl NotificationTransport for TelegramTransport {
    fn target(&self) -> String {
        format!("telegram:{}", self.chat_id.0)
    }

    async fn deliver(&self, message: &str) -> Result<(), DispatchError> {
        let parts = split_message(message, MAX_MESSAGE_CHARS);
        let count = parts.len();
        for part in parts {
            self.bot
                .send_message(self.chat_id, part)
                .await
                .map_err(classify)?;
        }
        debug!(chat_id = self.chat_id.0, parts = count, "Telegram message sent");
        Ok(())
    }
}

/// Telegram rejects longer message texts.
const MAX_MESSAGE_CHARS: usize = 4096;

/// A described API rejection is permanent: resending the same request gets
/// the same answer. Unrecognised descriptions and transport problems may pass.
fn classify(error: RequestError) -> DispatchError {
    match &error {
        RequestError::Api(ApiError::Unknown(_)) => DispatchError::Transient(error.to_string()),
        RequestError::Api(_) | RequestError::MigrateToChatId(_) => {
            DispatchError::Permanent(error.to_string())
        }
        _ => DispatchError::Transient(error.to_string()),
    }
}

/// Split `text` into parts of at most `limit` characters, breaking at line
/// ends where possible.
fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }
        let chars: Vec<char> = line.chars().collect();
        for chunk in chars.chunks(limit) {
            if current_len + chunk.len() > limit {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.extend(chunk);
            current_len += chunk.len();
        }
    }
    if !current.is_empty() || parts.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_are_permanent() {
        assert!(classify(RequestError::Api(ApiError::InvalidToken)).is_permanent());
        assert!(classify(RequestError::Api(ApiError::ChatNotFound)).is_permanent());
        assert!(classify(RequestError::Api(ApiError::BotBlocked)).is_permanent());
    }

    #[test]
    fn test_bad_requests_are_permanent() {
        assert!(classify(RequestError::Api(ApiError::MessageIsTooLong)).is_permanent());
        assert!(classify(RequestError::Api(ApiError::MessageTextIsEmpty)).is_permanent());
    }

    #[test]
    fn test_unrecognised_and_throttled_are_transient() {
        let unknown = RequestError::Api(ApiError::Unknown("Internal Server Error".into()));
        assert!(!classify(unknown).is_permanent());
        let throttled = RequestError::RetryAfter(teloxide::types::Seconds::from_seconds(3));
        assert!(!classify(throttled).is_permanent());
    }

    #[test]
    fn test_short_message_is_one_part() {
        assert_eq!(split_message("AAPL above 200\n", 4096), vec!["AAPL above 200\n"]);
        assert_eq!(split_message("", 4096), vec![String::new()]);
    }

    #[test]
    fn test_long_message_splits_at_lines() {
        let line = format!("{}\n", "x".repeat(99));
        let text = line.repeat(100);

        let parts = split_message(&text, 4096);

        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.chars().count() <= 4096));
        assert!(parts.iter().all(|p| p.ends_with('\n')));
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_overlong_line_is_cut() {
        let text = "é".repeat(10);
        let parts = split_message(&text, 4);
        assert_eq!(parts, vec!["éééé", "éééé", "éé"]);
    }

    #[test]
    fn test_target_names_chat() {
        let transport = TelegramTransport::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            chat_id: 42,
        });
        assert_eq!(transport.target(), "telegram:42");
    }
}
