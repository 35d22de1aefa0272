//! Monitoring operations exposed to request-handling shells.
//!
//! The CLI drives the engine through this trait. Every operation returns a
//! structured result or a typed [`Error`](crate::error::Error); none panic
//! into the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::alert::{AlertEvent, Direction};
use crate::domain::outlook::Outlook;
use crate::domain::portfolio::PortfolioEntry;
use crate::domain::ticker::Ticker;
use crate::error::Result;

/// Result of an add/remove call.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioChange {
    pub ticker: Ticker,
    /// False when the call was a no-op (already present / already absent).
    pub changed: bool,
    /// Portfolio contents after the call.
    pub tickers: Vec<Ticker>,
}

/// Alert state of one ticker, as reported by `check_alerts`.
#[derive(Debug, Clone, Serialize)]
pub struct AlertStatus {
    pub ticker: Ticker,
    /// Fired direction, or `None` while the ticker is armed.
    pub direction: Option<Direction>,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub fired_price: Option<Decimal>,
    pub last_price: Option<Decimal>,
    /// When the price behind `last_price` was fetched.
    pub price_fetched_at: Option<DateTime<Utc>>,
    /// The latest refresh failed or the served price is past its TTL.
    pub stale: bool,
}

/// Summary of one orchestration cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    /// Tickers whose price was evaluated.
    pub evaluated: usize,
    /// Tickers skipped because no rule is configured.
    pub skipped_no_rule: Vec<Ticker>,
    /// Tickers skipped because no usable price was available.
    pub unavailable: Vec<Ticker>,
    /// Tickers that hit the per-ticker timeout.
    pub timed_out: Vec<Ticker>,
    /// Events committed this cycle.
    pub alerts: Vec<AlertEvent>,
    /// Messages delivered.
    pub delivered: usize,
    /// Messages that failed after retries.
    pub dispatch_failures: usize,
    /// Permanent transport failures escalated as system errors.
    pub escalations: usize,
    /// The cycle was cancelled before every ticker finished.
    pub cancelled: bool,
}

/// Trading outlook plus delivery outcome.
#[derive(Debug, Clone, Serialize)]
pub struct OutlookReport {
    pub outlook: Outlook,
    /// Price came from a stale snapshot.
    pub stale: bool,
    /// `Some(delivered)` when the caller asked to send it.
    pub dispatched: Option<bool>,
}

/// Engine operations.
#[async_trait]
pub trait MonitorApi: Send + Sync {
    /// Start tracking a ticker. Idempotent.
    async fn add_ticker(&self, ticker: &str) -> Result<PortfolioChange>;

    /// Stop tracking a ticker and forget its alert history.
    async fn remove_ticker(&self, ticker: &str) -> Result<PortfolioChange>;

    /// Tracked tickers in symbol order.
    async fn list_portfolio(&self) -> Vec<PortfolioEntry>;

    /// Currently fired alerts. With a ticker, that ticker's state whether
    /// fired or not.
    async fn check_alerts(&self, ticker: Option<&str>) -> Result<Vec<AlertStatus>>;

    /// Run one orchestration cycle immediately.
    async fn run_cycle_now(&self) -> Result<CycleReport>;

    /// Stateless signal report for one ticker, optionally dispatched.
    async fn trading_outlook(&self, ticker: &str, send: bool) -> Result<OutlookReport>;

    /// Re-read the threshold rules. The previous set stays active on failure.
    fn reload_rules(&self) -> Result<usize>;
}
