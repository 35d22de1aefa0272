//! Composition root: builds an [`Engine`] from configuration.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::market::{FinnhubFetcher, YahooFetcher};
#[cfg(feature = "telegram")]
use crate::adapter::outbound::notifier::{TelegramConfig, TelegramTransport};
use crate::adapter::outbound::notifier::LogTransport;
use crate::adapter::outbound::rules::JsonRuleFile;
use crate::adapter::outbound::store::{JsonAlertStateFile, JsonPortfolioFile};
use crate::application::cache::PriceCache;
use crate::application::context::MonitorContext;
use crate::application::dispatch::Dispatcher;
use crate::application::engine::Engine;
use crate::application::limiter::RateLimiter;
use crate::application::portfolio::Portfolio;
use crate::application::rules::RuleBook;
use crate::application::tracker::AlertTracker;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::secrets::{Secrets, FINNHUB_API_KEY};
use crate::infrastructure::config::settings::{Config, MarketProvider};
use crate::port::outbound::notifier::NotificationTransport;
use crate::port::outbound::price::PriceFetcher;
use crate::port::outbound::store::{AlertStateRepository, PortfolioRepository, RuleSource};

/// The outbound adapters an engine is wired to.
pub struct Collaborators {
    pub rules: Box<dyn RuleSource>,
    pub fetcher: Arc<dyn PriceFetcher>,
    pub transport: Arc<dyn NotificationTransport>,
    pub repository: Arc<dyn PortfolioRepository>,
    pub alerts: Arc<dyn AlertStateRepository>,
}

impl Collaborators {
    /// Production adapters for `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a secret the configuration needs is
    /// missing.
    pub fn from_config(config: &Config, secrets: &Secrets) -> Result<Self> {
        Ok(Self {
            rules: Box::new(JsonRuleFile::new(&config.rules.path)),
            fetcher: build_fetcher(config, secrets)?,
            transport: build_transport(config, secrets)?,
            repository: Arc::new(JsonPortfolioFile::new(&config.portfolio.path)),
            alerts: Arc::new(JsonAlertStateFile::new(config.portfolio.alerts_path())),
        })
    }
}

/// Build the configured price fetcher.
///
/// # Errors
///
/// Returns [`ConfigError::MissingSecret`] if Finnhub is selected without an
/// API key.
pub fn build_fetcher(config: &Config, secrets: &Secrets) -> Result<Arc<dyn PriceFetcher>> {
    let http = config.market.http();
    let fetcher: Arc<dyn PriceFetcher> = match config.market.provider {
        MarketProvider::Yahoo => Arc::new(YahooFetcher::new(http)),
        MarketProvider::Finnhub => {
            let key = secrets
                .finnhub_api_key
                .clone()
                .ok_or(ConfigError::MissingSecret {
                    name: FINNHUB_API_KEY,
                })?;
            Arc::new(FinnhubFetcher::new(http, key))
        }
    };
    info!(provider = fetcher.name(), "Price provider configured");
    Ok(fetcher)
}

/// Build the notification transport: Telegram when enabled, else the log.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if Telegram is enabled in a build
/// without the `telegram` feature.
pub fn build_transport(config: &Config, secrets: &Secrets) -> Result<Arc<dyn NotificationTransport>> {
    if !config.telegram.enabled {
        info!("Telegram disabled, notifications go to the log");
        return Ok(Arc::new(LogTransport));
    }

    #[cfg(feature = "telegram")]
    {
        let Some(credentials) = secrets.telegram.as_ref() else {
            warn!("Telegram enabled but no credentials were read, using the log");
            return Ok(Arc::new(LogTransport));
        };
        let transport = TelegramTransport::new(&TelegramConfig {
            bot_token: credentials.bot_token.clone(),
            chat_id: credentials.chat_id,
        });
        info!(transport = %transport.target(), "Telegram notifications enabled");
        Ok(Arc::new(transport))
    }

    #[cfg(not(feature = "telegram"))]
    {
        let _ = secrets;
        warn!("Telegram enabled in config but this build lacks the telegram feature");
        Err(ConfigError::InvalidValue {
            field: "telegram.enabled",
            reason: "built without the telegram feature".to_string(),
        }
        .into())
    }
}

/// Wire the engine's stores around `parts`.
///
/// # Errors
///
/// Fails if the threshold rules are invalid or the persisted portfolio or
/// alert states cannot be read. All are fatal at startup.
pub async fn assemble(config: &Config, parts: Collaborators) -> Result<Engine> {
    let rules = Arc::new(RuleBook::load(parts.rules)?);

    let limiter = Arc::new(RateLimiter::per_second(config.monitor.fetch_rate_per_sec));
    let cache = Arc::new(PriceCache::new(parts.fetcher, limiter, config.cache.policy()));
    let tracker = Arc::new(AlertTracker::with_store(
        config.monitor.evaluation_policy(),
        parts.alerts,
    ));
    let portfolio = Arc::new(
        Portfolio::open(parts.repository, Arc::clone(&cache), Arc::clone(&tracker)).await?,
    );
    let restored = tracker.restore(&portfolio.tickers().await).await?;
    let dispatcher = Arc::new(Dispatcher::new(parts.transport, config.dispatch.retry_policy()));

    let settings = config.cycle_settings();
    info!(
        workers = settings.workers,
        restored_alerts = restored,
        ticker_timeout_ms = settings.ticker_timeout.as_millis() as u64,
        summary = config.dispatch.summary,
        "Engine assembled"
    );

    Ok(Engine::new(
        MonitorContext {
            rules,
            cache,
            tracker,
            portfolio,
            dispatcher,
        },
        settings,
    ))
}

/// Build the production engine for `config`.
///
/// # Errors
///
/// See [`Collaborators::from_config`] and [`assemble`].
pub async fn build_engine(config: &Config, secrets: &Secrets) -> Result<Engine> {
    assemble(config, Collaborators::from_config(config, secrets)?).await
}
