//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application
//! settings. Every table is optional; missing values take the defaults
//! below. Secrets never live here, see [`super::secrets`].
//!
//! # Example
//!
//! ```no_run
//! use tickwatch::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::adapter::outbound::market::HttpSettings;
use crate::application::cache::CachePolicy;
use crate::application::dispatch::RetryPolicy;
use crate::application::format::DEFAULT_SUMMARY_HEADER;
use crate::application::monitor::{CycleSettings, DispatchMode};
use crate::domain::alert::EvaluationPolicy;
use crate::error::{ConfigError, Result};

const MAX_DEFAULT_WORKERS: usize = 8;

/// Upper bound for every millisecond timeout and delay.
const MAX_TIMEOUT_MS: u64 = 3_600_000;
/// Upper bound for every second-based interval: one week.
const MAX_INTERVAL_SECS: u64 = 604_800;
/// Slowest accepted pacing: one request every 1000 seconds.
const MIN_FETCH_RATE_PER_SEC: f64 = 0.001;

/// Monitoring loop settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between scheduled cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Deadline for one ticker's fetch, evaluation and dispatch.
    #[serde(default = "default_ticker_timeout_ms")]
    pub ticker_timeout_ms: u64,
    /// Tickers processed concurrently. Defaults to the CPU count, capped at 8.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Price requests per second across all workers. 0 disables pacing.
    #[serde(default = "default_fetch_rate_per_sec")]
    pub fetch_rate_per_sec: f64,
    /// Seconds between threshold file reloads. 0 never reloads.
    #[serde(default)]
    pub rules_reload_secs: u64,
    /// Minimum seconds between two alerts for one ticker. 0 disables.
    #[serde(default)]
    pub cooldown_secs: u64,
    /// Treat a ticker's first observed price as a baseline instead of
    /// alerting on it.
    #[serde(default)]
    pub baseline_first_observation: bool,
}

const fn default_interval_secs() -> u64 {
    60
}

const fn default_ticker_timeout_ms() -> u64 {
    10_000
}

fn default_workers() -> usize {
    num_cpus::get().clamp(1, MAX_DEFAULT_WORKERS)
}

const fn default_fetch_rate_per_sec() -> f64 {
    5.0
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            ticker_timeout_ms: default_ticker_timeout_ms(),
            workers: default_workers(),
            fetch_rate_per_sec: default_fetch_rate_per_sec(),
            rules_reload_secs: 0,
            cooldown_secs: 0,
            baseline_first_observation: false,
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// `None` when reloading is disabled.
    #[must_use]
    pub const fn rules_reload_interval(&self) -> Option<Duration> {
        if self.rules_reload_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.rules_reload_secs))
        }
    }

    #[must_use]
    pub fn evaluation_policy(&self) -> EvaluationPolicy {
        let cooldown = i64::try_from(self.cooldown_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(chrono::Duration::try_seconds);
        EvaluationPolicy {
            cooldown,
            baseline_first_observation: self.baseline_first_observation,
        }
    }
}

/// Market data cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Stale snapshots are served up to `ttl_secs * staleness_multiplier` old.
    #[serde(default = "default_staleness_multiplier")]
    pub staleness_multiplier: u32,
}

const fn default_ttl_secs() -> u64 {
    60
}

const fn default_staleness_multiplier() -> u32 {
    10
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            staleness_multiplier: default_staleness_multiplier(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn policy(&self) -> CachePolicy {
        let ttl = Duration::from_secs(self.ttl_secs);
        CachePolicy {
            ttl,
            staleness_ceiling: ttl.saturating_mul(self.staleness_multiplier),
        }
    }
}

/// Notification delivery settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Group a cycle's alerts into one message.
    #[serde(default = "default_true")]
    pub summary: bool,
    #[serde(default = "default_summary_header")]
    pub summary_header: String,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_delay_ms() -> u64 {
    2_000
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

const fn default_true() -> bool {
    true
}

fn default_summary_header() -> String {
    DEFAULT_SUMMARY_HEADER.to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            summary: true,
            summary_header: default_summary_header(),
        }
    }
}

impl DispatchConfig {
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    #[must_use]
    pub fn mode(&self) -> DispatchMode {
        if self.summary {
            DispatchMode::Summary {
                header: self.summary_header.clone(),
            }
        } else {
            DispatchMode::PerEvent
        }
    }
}

/// Threshold rule file location.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_rules_path")]
    pub path: PathBuf,
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("config/alerts_config.json")
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: default_rules_path(),
        }
    }
}

/// Portfolio and alert state file locations.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioConfig {
    #[serde(default = "default_portfolio_path")]
    pub path: PathBuf,
    /// Alert states. Defaults to `alerts.json` next to the portfolio file.
    #[serde(default)]
    pub alerts_path: Option<PathBuf>,
}

/// `~/.tickwatch/portfolio.json`, or `./.tickwatch/` without a home directory.
fn default_portfolio_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tickwatch")
        .join("portfolio.json")
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            path: default_portfolio_path(),
            alerts_path: None,
        }
    }
}

impl PortfolioConfig {
    #[must_use]
    pub fn alerts_path(&self) -> PathBuf {
        self.alerts_path
            .clone()
            .unwrap_or_else(|| self.path.with_file_name("alerts.json"))
    }
}

/// Supported price providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketProvider {
    #[default]
    Yahoo,
    /// Requires `FINNHUB_API_KEY`.
    Finnhub,
}

/// Price provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    #[serde(default)]
    pub provider: MarketProvider,
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

const fn default_http_timeout_ms() -> u64 {
    8_000
}

const fn default_connect_timeout_ms() -> u64 {
    3_000
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            provider: MarketProvider::default(),
            timeout_ms: default_http_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl MarketConfig {
    #[must_use]
    pub const fn http(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_millis(self.timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }
}

/// Telegram notification settings. Credentials come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramAppConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub telegram: TelegramAppConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize the tracing subscriber from the `[logging]` table.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Cycle settings derived from `[monitor]` and `[dispatch]`.
    #[must_use]
    pub fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            workers: self.monitor.workers,
            ticker_timeout: Duration::from_millis(self.monitor.ticker_timeout_ms),
            mode: self.dispatch.mode(),
        }
    }

    fn validate(&self) -> Result<()> {
        let positive: [(&'static str, u64); 6] = [
            ("monitor.interval_secs", self.monitor.interval_secs),
            ("monitor.ticker_timeout_ms", self.monitor.ticker_timeout_ms),
            ("monitor.workers", self.monitor.workers as u64),
            ("cache.ttl_secs", self.cache.ttl_secs),
            ("dispatch.max_attempts", u64::from(self.dispatch.max_attempts)),
            ("market.timeout_ms", self.market.timeout_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }

        let bounded: [(&'static str, u64, u64); 8] = [
            ("monitor.interval_secs", self.monitor.interval_secs, MAX_INTERVAL_SECS),
            ("monitor.rules_reload_secs", self.monitor.rules_reload_secs, MAX_INTERVAL_SECS),
            ("cache.ttl_secs", self.cache.ttl_secs, MAX_INTERVAL_SECS),
            ("monitor.ticker_timeout_ms", self.monitor.ticker_timeout_ms, MAX_TIMEOUT_MS),
            ("dispatch.base_delay_ms", self.dispatch.base_delay_ms, MAX_TIMEOUT_MS),
            ("dispatch.max_delay_ms", self.dispatch.max_delay_ms, MAX_TIMEOUT_MS),
            ("market.timeout_ms", self.market.timeout_ms, MAX_TIMEOUT_MS),
            ("market.connect_timeout_ms", self.market.connect_timeout_ms, MAX_TIMEOUT_MS),
        ];
        for (field, value, max) in bounded {
            if value > max {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be at most {max}"),
                }
                .into());
            }
        }

        if self.cache.staleness_multiplier < 1 {
            return Err(ConfigError::InvalidValue {
                field: "cache.staleness_multiplier",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        let rate = self.monitor.fetch_rate_per_sec;
        if !rate.is_finite() || rate < 0.0 || (rate > 0.0 && rate < MIN_FETCH_RATE_PER_SEC) {
            return Err(ConfigError::InvalidValue {
                field: "monitor.fetch_rate_per_sec",
                reason: format!("must be 0 or at least {MIN_FETCH_RATE_PER_SEC}"),
            }
            .into());
        }
        if self.monitor.cooldown_secs > 0 && self.monitor.evaluation_policy().cooldown.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "monitor.cooldown_secs",
                reason: "out of range".to_string(),
            }
            .into());
        }
        if self.dispatch.max_delay_ms < self.dispatch.base_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.max_delay_ms",
                reason: "must be >= base_delay_ms".to_string(),
            }
            .into());
        }
        if self.rules.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField { field: "rules.path" }.into());
        }
        if self.portfolio.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "portfolio.path",
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.monitor.interval_secs, 60);
        assert_eq!(config.monitor.ticker_timeout_ms, 10_000);
        assert!(config.monitor.workers >= 1 && config.monitor.workers <= 8);
        assert_eq!(config.cache.policy().staleness_ceiling, Duration::from_secs(600));
        assert_eq!(config.dispatch.retry_policy(), RetryPolicy::default());
        assert_eq!(config.market.provider, MarketProvider::Yahoo);
        assert!(!config.telegram.enabled);
        assert!(config.portfolio.path.ends_with(".tickwatch/portfolio.json"));
    }

    #[test]
    fn test_parses_tables() {
        let config = Config::parse_toml(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [monitor]
            interval_secs = 30
            workers = 2
            cooldown_secs = 300
            baseline_first_observation = true

            [dispatch]
            summary = false

            [market]
            provider = "finnhub"
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.format, "json");
        assert_eq!(config.monitor.interval(), Duration::from_secs(30));
        assert_eq!(config.cycle_settings().workers, 2);
        assert_eq!(config.cycle_settings().mode, DispatchMode::PerEvent);
        let policy = config.monitor.evaluation_policy();
        assert_eq!(policy.cooldown, Some(chrono::Duration::seconds(300)));
        assert!(policy.baseline_first_observation);
        assert_eq!(config.market.provider, MarketProvider::Finnhub);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = Config::parse_toml("[monitor]\ninterval_secs = 0");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "monitor.interval_secs",
                ..
            }))
        ));
    }

    #[test]
    fn test_rejects_inverted_backoff() {
        let result = Config::parse_toml("[dispatch]\nbase_delay_ms = 5000\nmax_delay_ms = 1000");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let result = Config::parse_toml("[market]\nprovider = \"bloomberg\"");
        assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
    }

    #[test]
    fn test_rejects_rate_too_small_to_pace() {
        let result = Config::parse_toml("[monitor]\nfetch_rate_per_sec = 1e-300");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "monitor.fetch_rate_per_sec",
                ..
            }))
        ));
        assert!(Config::parse_toml("[monitor]\nfetch_rate_per_sec = 0").is_ok());
    }

    #[test]
    fn test_rejects_unbounded_durations() {
        let result = Config::parse_toml("[monitor]\nticker_timeout_ms = 18446744073709551615");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "monitor.ticker_timeout_ms",
                ..
            }))
        ));
        assert!(Config::parse_toml("[monitor]\ninterval_secs = 99999999999").is_err());
    }

    #[test]
    fn test_alerts_file_sits_next_to_portfolio() {
        let config = Config::parse_toml("[portfolio]\npath = \"/data/folio.json\"").unwrap();
        assert_eq!(config.portfolio.alerts_path(), PathBuf::from("/data/alerts.json"));

        let config = Config::parse_toml(
            "[portfolio]\npath = \"/data/folio.json\"\nalerts_path = \"/state/a.json\"",
        )
        .unwrap();
        assert_eq!(config.portfolio.alerts_path(), PathBuf::from("/state/a.json"));
    }

    #[test]
    fn test_reload_interval_disabled_by_default() {
        let config = Config::default();
        assert!(config.monitor.rules_reload_interval().is_none());
        assert!(config.monitor.evaluation_policy().cooldown.is_none());
    }
}
