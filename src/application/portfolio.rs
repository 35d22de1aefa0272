//! Portfolio store.
//!
//! The tracked set lives behind an async read-write lock. Mutations hold the
//! write lock across the durable commit, so a call only returns after the
//! repository has the new set, and a failed commit leaves memory untouched.
//! Every mutation also drops the ticker's cached price and alert history.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::application::cache::PriceCache;
use crate::application::tracker::AlertTracker;
use crate::domain::portfolio::PortfolioEntry;
use crate::domain::ticker::Ticker;
use crate::error::PersistenceError;
use crate::port::outbound::store::PortfolioRepository;

/// The set of actively tracked tickers.
pub struct Portfolio {
    entries: RwLock<BTreeMap<Ticker, PortfolioEntry>>,
    repository: Arc<dyn PortfolioRepository>,
    cache: Arc<PriceCache>,
    tracker: Arc<AlertTracker>,
}

impl Portfolio {
    /// Rehydrate from the repository.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the persisted set cannot be read.
    pub async fn open(
        repository: Arc<dyn PortfolioRepository>,
        cache: Arc<PriceCache>,
        tracker: Arc<AlertTracker>,
    ) -> Result<Self, PersistenceError> {
        let loaded = repository.load().await?;
        let entries: BTreeMap<Ticker, PortfolioEntry> = loaded
            .into_iter()
            .map(|entry| (entry.ticker.clone(), entry))
            .collect();
        info!(tickers = entries.len(), "Portfolio loaded");

        Ok(Self {
            entries: RwLock::new(entries),
            repository,
            cache,
            tracker,
        })
    }

    /// Start tracking `ticker`. Returns false if it was already tracked.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the commit fails; the ticker is then
    /// not added.
    pub async fn add(&self, ticker: Ticker) -> Result<bool, PersistenceError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&ticker) {
            return Ok(false);
        }

        let entry = PortfolioEntry::new(ticker.clone(), Utc::now());
        let mut next: Vec<PortfolioEntry> = entries.values().cloned().collect();
        next.push(entry.clone());
        self.commit(&next, "add", &ticker).await?;

        entries.insert(ticker.clone(), entry);
        self.cache.invalidate(&ticker);
        self.tracker.clear(&ticker);
        info!(ticker = %ticker, "Ticker added to portfolio");
        Ok(true)
    }

    /// Stop tracking `ticker`. Returns false if it was not tracked.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the commit fails; the ticker then
    /// stays tracked.
    pub async fn remove(&self, ticker: &Ticker) -> Result<bool, PersistenceError> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(ticker) {
            return Ok(false);
        }

        let next: Vec<PortfolioEntry> = entries
            .values()
            .filter(|entry| &entry.ticker != ticker)
            .cloned()
            .collect();
        self.commit(&next, "remove", ticker).await?;

        entries.remove(ticker);
        self.cache.invalidate(ticker);
        self.tracker.clear(ticker);
        info!(ticker = %ticker, "Ticker removed from portfolio");
        Ok(true)
    }

    async fn commit(
        &self,
        next: &[PortfolioEntry],
        operation: &'static str,
        ticker: &Ticker,
    ) -> Result<(), PersistenceError> {
        self.repository.save(next).await.map_err(|e| {
            error!(ticker = %ticker, operation, error = %e, "Portfolio commit failed");
            e
        })
    }

    /// Entries in ticker order.
    pub async fn list(&self) -> Vec<PortfolioEntry> {
        self.entries.read().await.values().cloned().collect()
    }

    pub async fn tickers(&self) -> Vec<Ticker> {
        self.entries.read().await.keys().cloned().collect()
    }

    pub async fn contains(&self, ticker: &Ticker) -> bool {
        self.entries.read().await.contains_key(ticker)
    }

    /// Run `commit` only if `ticker` is tracked, holding the read lock
    /// throughout so a concurrent removal cannot interleave.
    pub async fn commit_if_tracked<R>(&self, ticker: &Ticker, commit: impl FnOnce() -> R) -> Option<R> {
        let entries = self.entries.read().await;
        entries.contains_key(ticker).then(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::store::MemoryPortfolioStore;
    use crate::application::cache::CachePolicy;
    use crate::application::limiter::RateLimiter;
    use crate::error::PriceError;
    use crate::port::outbound::price::{FetchedPrice, PriceFetcher};
    use async_trait::async_trait;

    struct NoPrices;

    #[async_trait]
    impl PriceFetcher for NoPrices {
        fn name(&self) -> &'static str {
            "none"
        }

        async fn fetch(&self, ticker: &Ticker) -> Result<FetchedPrice, PriceError> {
            Err(PriceError::unavailable(ticker, "offline"))
        }
    }

    async fn portfolio(store: Arc<MemoryPortfolioStore>) -> Portfolio {
        let cache = Arc::new(PriceCache::new(
            Arc::new(NoPrices),
            Arc::new(RateLimiter::unlimited()),
            CachePolicy::default(),
        ));
        Portfolio::open(store, cache, Arc::new(AlertTracker::default()))
            .await
            .unwrap()
    }

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_add_is_idempotent_and_persisted() {
        let store = Arc::new(MemoryPortfolioStore::new());
        let portfolio = portfolio(store.clone()).await;

        assert!(portfolio.add(ticker("AAPL")).await.unwrap());
        assert!(!portfolio.add(ticker("AAPL")).await.unwrap());
        assert_eq!(store.tickers(), vec![ticker("AAPL")]);
    }

    #[tokio::test]
    async fn test_remove_absent_returns_false() {
        let portfolio = portfolio(Arc::new(MemoryPortfolioStore::new())).await;
        assert!(!portfolio.remove(&ticker("AAPL")).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_commit_is_not_applied() {
        let store = Arc::new(MemoryPortfolioStore::new());
        let portfolio = portfolio(store.clone()).await;
        portfolio.add(ticker("AAPL")).await.unwrap();

        store.fail_saves(true);
        assert!(portfolio.add(ticker("MSFT")).await.is_err());
        assert!(portfolio.remove(&ticker("AAPL")).await.is_err());

        assert_eq!(portfolio.tickers().await, vec![ticker("AAPL")]);
        assert_eq!(store.tickers(), vec![ticker("AAPL")]);
    }

    #[tokio::test]
    async fn test_reopen_rehydrates() {
        let store = Arc::new(MemoryPortfolioStore::new());
        {
            let portfolio = portfolio(store.clone()).await;
            portfolio.add(ticker("NVDA")).await.unwrap();
            portfolio.add(ticker("AAPL")).await.unwrap();
        }
        let reopened = portfolio(store).await;
        assert_eq!(reopened.tickers().await, vec![ticker("AAPL"), ticker("NVDA")]);
    }

    #[tokio::test]
    async fn test_commit_if_tracked() {
        let portfolio = portfolio(Arc::new(MemoryPortfolioStore::new())).await;
        portfolio.add(ticker("AAPL")).await.unwrap();

        assert_eq!(portfolio.commit_if_tracked(&ticker("AAPL"), || 1).await, Some(1));
        assert_eq!(portfolio.commit_if_tracked(&ticker("MSFT"), || 1).await, None);
    }
}
