//! Secrets read from the environment.
//!
//! Read once at startup. `.env` is loaded by the binary before this runs.
//! Which secrets are required depends on the configuration: a missing one
//! that the configuration needs is fatal.

use super::settings::{Config, MarketProvider};
use crate::error::ConfigError;

pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const FINNHUB_API_KEY: &str = "FINNHUB_API_KEY";

/// Telegram bot credentials.
#[derive(Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: i64,
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Secrets needed by the configured adapters.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub telegram: Option<TelegramCredentials>,
    pub finnhub_api_key: Option<String>,
}

impl Secrets {
    /// Read the secrets `config` needs from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] for an absent or empty
    /// variable the configuration requires, and
    /// [`ConfigError::InvalidValue`] for a chat id that is not an integer.
    pub fn from_env(config: &Config) -> Result<Self, ConfigError> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Same as [`Secrets::from_env`] with an explicit lookup.
    ///
    /// # Errors
    ///
    /// See [`Secrets::from_env`].
    pub fn from_lookup(
        config: &Config,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let require = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingSecret { name })
        };

        let telegram = if config.telegram.enabled {
            let bot_token = require(TELEGRAM_BOT_TOKEN)?;
            let chat_id = require(TELEGRAM_CHAT_ID)?
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                    field: TELEGRAM_CHAT_ID,
                    reason: e.to_string(),
                })?;
            Some(TelegramCredentials { bot_token, chat_id })
        } else {
            None
        };

        let finnhub_api_key = match config.market.provider {
            MarketProvider::Finnhub => Some(require(FINNHUB_API_KEY)?),
            MarketProvider::Yahoo => None,
        };

        Ok(Self {
            telegram,
            finnhub_api_key,
        })
    }
}
