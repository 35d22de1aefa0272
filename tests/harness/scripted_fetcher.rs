use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tickwatch::domain::Ticker;
use tickwatch::error::PriceError;
use tickwatch::port::{FetchedPrice, PriceFetcher};

/// One scripted provider response.
#[derive(Debug, Clone)]
pub enum Quote {
    Price(Decimal),
    Fail,
    /// Answer with the price after a delay.
    Slow(Duration, Decimal),
}

/// Deterministic price provider. Each ticker replays its script in order
/// and keeps repeating the last step once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<Ticker, VecDeque<Quote>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, ticker: &str, quotes: impl IntoIterator<Item = Quote>) {
        let ticker = Ticker::parse(ticker).expect("valid ticker");
        self.scripts
            .lock()
            .entry(ticker)
            .or_default()
            .extend(quotes);
    }

    pub fn prices(&self, ticker: &str, prices: &[Decimal]) {
        self.script(ticker, prices.iter().copied().map(Quote::Price));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self, ticker: &Ticker) -> Option<Quote> {
        let mut scripts = self.scripts.lock();
        let script = scripts.get_mut(ticker)?;
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl PriceFetcher for ScriptedFetcher {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<FetchedPrice, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next(ticker) {
            Some(Quote::Price(price)) => Ok(FetchedPrice::new(price)),
            Some(Quote::Slow(delay, price)) => {
                tokio::time::sleep(delay).await;
                Ok(FetchedPrice::new(price))
            }
            Some(Quote::Fail) => Err(PriceError::unavailable(ticker, "scripted failure")),
            None => Err(PriceError::unavailable(ticker, "no script")),
        }
    }
}
