//! Point-in-time price observations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::ticker::Ticker;

/// A single price observation with its fetch timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceSnapshot {
    pub ticker: Ticker,
    pub price: Decimal,
    /// When the cache obtained this price from the provider.
    pub fetched_at: DateTime<Utc>,
    /// Provider-reported quote time, when known.
    pub quoted_at: Option<DateTime<Utc>>,
}

impl PriceSnapshot {
    #[must_use]
    pub fn new(ticker: Ticker, price: Decimal, fetched_at: DateTime<Utc>) -> Self {
        Self {
            ticker,
            price,
            fetched_at,
            quoted_at: None,
        }
    }

    #[must_use]
    pub fn with_quote_time(mut self, quoted_at: DateTime<Utc>) -> Self {
        self.quoted_at = Some(quoted_at);
        self
    }
}
