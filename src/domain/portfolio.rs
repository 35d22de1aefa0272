//! Tracked-ticker portfolio entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ticker::Ticker;

/// One actively tracked ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub ticker: Ticker,
    pub added_at: DateTime<Utc>,
}

impl PortfolioEntry {
    #[must_use]
    pub fn new(ticker: Ticker, added_at: DateTime<Utc>) -> Self {
        Self { ticker, added_at }
    }
}
