//! Yahoo Finance chart API price fetcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;

use super::{build_client, request_error, to_price, HttpSettings};
use crate::domain::ticker::Ticker;
use crate::error::PriceError;
use crate::port::outbound::price::{FetchedPrice, PriceFetcher};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

/// Fetches the regular market price from Yahoo's chart endpoint.
pub struct YahooFetcher {
    http: HttpClient,
    base_url: String,
}

impl YahooFetcher {
    #[must_use]
    pub fn new(settings: HttpSettings) -> Self {
        Self::with_base_url(settings, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(settings: HttpSettings, base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(settings),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PriceFetcher for YahooFetcher {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<FetchedPrice, PriceError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let response = self
            .http
            .get(&url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await
            .map_err(|e| request_error(ticker, e))?;

        let status = response.status();
        // Unknown symbols come back as 404 with a JSON error body.
        let body: ChartEnvelope = response.json().await.map_err(|e| {
            if status.is_success() {
                PriceError::unavailable(
                    ticker,
                    format!("malformed chart payload: {}", e.without_url()),
                )
            } else {
                PriceError::unavailable(ticker, format!("HTTP {status}"))
            }
        })?;

        let fetched = parse_chart(ticker, body)?;
        debug!(ticker = %ticker, price = %fetched.price, "Yahoo quote");
        Ok(fetched)
    }
}

fn parse_chart(ticker: &Ticker, body: ChartEnvelope) -> Result<FetchedPrice, PriceError> {
    if let Some(error) = body.chart.error {
        let reason = match error.description {
            Some(description) => format!("{}: {description}", error.code),
            None => error.code,
        };
        return Err(PriceError::unavailable(ticker, reason));
    }

    let meta = body
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|result| result.meta)
        .ok_or_else(|| PriceError::unavailable(ticker, "empty chart result"))?;

    let price = meta
        .regular_market_price
        .and_then(to_price)
        .ok_or_else(|| PriceError::unavailable(ticker, "no regular market price"))?;

    let mut fetched = FetchedPrice::new(price);
    fetched.timestamp = meta
        .regular_market_time
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    Ok(fetched)
}
