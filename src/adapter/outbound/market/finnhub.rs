//! Finnhub quote API price fetcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;

use super::{build_client, request_error, to_price, HttpSettings};
use crate::domain::ticker::Ticker;
use crate::error::PriceError;
use crate::port::outbound::price::{FetchedPrice, PriceFetcher};

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
const TOKEN_HEADER: &str = "X-Finnhub-Token";

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price. Zero for unknown symbols.
    c: f64,
    /// Quote time, unix seconds.
    #[serde(default)]
    t: i64,
}

pub struct FinnhubFetcher {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl FinnhubFetcher {
    #[must_use]
    pub fn new(settings: HttpSettings, api_key: String) -> Self {
        Self::with_base_url(settings, api_key, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(settings: HttpSettings, api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(settings),
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl PriceFetcher for FinnhubFetcher {
    fn name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<FetchedPrice, PriceError> {
        let url = format!("{}/quote", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, &self.api_key)
            .query(&[("symbol", ticker.as_str())])
            .send()
            .await
            .map_err(|e| request_error(ticker, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::unavailable(ticker, format!("HTTP {status}")));
        }

        let quote: QuoteResponse = response
            .json()
            .await
            .map_err(|e| {
                PriceError::unavailable(ticker, format!("malformed quote: {}", e.without_url()))
            })?;

        let fetched = parse_quote(ticker, &quote)?;
        debug!(ticker = %ticker, price = %fetched.price, "Finnhub quote");
        Ok(fetched)
    }
}

fn parse_quote(ticker: &Ticker, quote: &QuoteResponse) -> Result<FetchedPrice, PriceError> {
    let price = to_price(quote.c)
        .ok_or_else(|| PriceError::unavailable(ticker, "no quote for symbol"))?;

    let mut fetched = FetchedPrice::new(price);
    if quote.t > 0 {
        fetched.timestamp = DateTime::<Utc>::from_timestamp(quote.t, 0);
    }
    Ok(fetched)
}
