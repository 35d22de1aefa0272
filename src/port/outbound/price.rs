//! Price-fetch port.
//!
//! Implemented by market-data adapters. A fetch either returns a snapshot
//! price or fails; caching and stale-serving live in the application layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::ticker::Ticker;
use crate::error::PriceError;

/// A price as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPrice {
    pub price: Decimal,
    /// Provider quote time, if the provider reports one.
    pub timestamp: Option<DateTime<Utc>>,
}

impl FetchedPrice {
    #[must_use]
    pub const fn new(price: Decimal) -> Self {
        Self {
            price,
            timestamp: None,
        }
    }
}

/// Source of live prices.
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    /// Fetch the current price for `ticker`.
    async fn fetch(&self, ticker: &Ticker) -> Result<FetchedPrice, PriceError>;
}
