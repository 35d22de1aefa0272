//! Price fetchers backed by public market data APIs.
//!
//! Both fetchers share one HTTP client setup and map every failure, HTTP or
//! payload, to [`PriceError`](crate::error::PriceError) so the cache can
//! fall back to a stale snapshot.

pub mod finnhub;
pub mod yahoo;

use std::time::Duration;

use reqwest::Client as HttpClient;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::ticker::Ticker;
use crate::error::PriceError;

pub use finnhub::FinnhubFetcher;
pub use yahoo::YahooFetcher;

const USER_AGENT: &str = concat!("tickwatch/", env!("CARGO_PKG_VERSION"));

/// HTTP client settings shared by the fetchers.
#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            connect_timeout: Duration::from_secs(3),
        }
    }
}

fn build_client(settings: HttpSettings) -> HttpClient {
    HttpClient::builder()
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|err| {
            warn!(error = %err, "Failed to build HTTP client, using defaults");
            HttpClient::new()
        })
}

/// Map a failed request. The URL is dropped from the message since it may
/// carry an API key.
fn request_error(ticker: &Ticker, error: reqwest::Error) -> PriceError {
    if error.is_timeout() {
        PriceError::Timeout {
            ticker: ticker.clone(),
        }
    } else {
        PriceError::unavailable(ticker, error.without_url())
    }
}

/// Convert a provider float to a positive decimal price.
fn to_price(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.normalize())
        .filter(|d| d.is_sign_positive() && !d.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_price() {
        assert_eq!(to_price(189.25), Some(dec!(189.25)));
        assert_eq!(to_price(0.0), None);
        assert_eq!(to_price(-1.0), None);
        assert_eq!(to_price(f64::NAN), None);
    }
}
