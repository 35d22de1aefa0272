//! Short-TTL market data cache with stale-serving.
//!
//! Each ticker owns a slot with two locks: an async refresh lock that keeps
//! one fetch in flight per ticker, and a short sync lock around the stored
//! snapshot. Different tickers never contend on either.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::application::limiter::RateLimiter;
use crate::domain::price::PriceSnapshot;
use crate::domain::ticker::Ticker;
use crate::error::PriceError;
use crate::port::outbound::price::PriceFetcher;

/// Freshness rules for cached prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Snapshots younger than this are served without fetching.
    pub ttl: Duration,
    /// After a failed refresh, snapshots younger than this are still served.
    pub staleness_ceiling: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            staleness_ceiling: Duration::from_secs(600),
        }
    }
}

/// A price served by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPrice {
    pub snapshot: PriceSnapshot,
    /// Served from an old snapshot because the refresh failed.
    pub stale: bool,
}

/// Freshness of a ticker's cached price without triggering a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    pub snapshot: Option<PriceSnapshot>,
    /// The latest refresh failed, or the snapshot is older than the TTL.
    pub stale: bool,
}

#[derive(Default)]
struct Stored {
    snapshot: Option<PriceSnapshot>,
    stored_at: Option<Instant>,
    degraded: bool,
}

#[derive(Default)]
struct Slot {
    refresh: tokio::sync::Mutex<()>,
    stored: Mutex<Stored>,
}

impl Slot {
    fn younger_than(&self, age: Duration) -> Option<PriceSnapshot> {
        let stored = self.stored.lock();
        match (&stored.snapshot, stored.stored_at) {
            (Some(snapshot), Some(at)) if at.elapsed() < age => Some(snapshot.clone()),
            _ => None,
        }
    }
}

/// Per-ticker price cache in front of a [`PriceFetcher`].
pub struct PriceCache {
    fetcher: Arc<dyn PriceFetcher>,
    limiter: Arc<RateLimiter>,
    policy: CachePolicy,
    slots: DashMap<Ticker, Arc<Slot>>,
}

impl PriceCache {
    #[must_use]
    pub fn new(fetcher: Arc<dyn PriceFetcher>, limiter: Arc<RateLimiter>, policy: CachePolicy) -> Self {
        Self {
            fetcher,
            limiter,
            policy,
            slots: DashMap::new(),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn slot(&self, ticker: &Ticker) -> Arc<Slot> {
        // Clone the Arc out so the shard lock is released before any await.
        self.slots.entry(ticker.clone()).or_default().value().clone()
    }

    /// Get a price, refreshing from the provider on miss or expiry.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`PriceError`] when the refresh fails and no
    /// snapshot younger than the staleness ceiling exists.
    pub async fn get(&self, ticker: &Ticker) -> Result<CachedPrice, PriceError> {
        let slot = self.slot(ticker);

        if let Some(snapshot) = slot.younger_than(self.policy.ttl) {
            return Ok(CachedPrice {
                snapshot,
                stale: false,
            });
        }

        let _refresh = slot.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(snapshot) = slot.younger_than(self.policy.ttl) {
            return Ok(CachedPrice {
                snapshot,
                stale: false,
            });
        }

        self.limiter.acquire().await;

        match self.fetcher.fetch(ticker).await {
            Ok(fetched) => {
                let mut snapshot = PriceSnapshot::new(ticker.clone(), fetched.price, Utc::now());
                if let Some(quoted_at) = fetched.timestamp {
                    snapshot = snapshot.with_quote_time(quoted_at);
                }
                debug!(ticker = %ticker, price = %snapshot.price, "Price refreshed");

                let mut stored = slot.stored.lock();
                stored.snapshot = Some(snapshot.clone());
                stored.stored_at = Some(Instant::now());
                stored.degraded = false;

                Ok(CachedPrice {
                    snapshot,
                    stale: false,
                })
            }
            Err(e) => {
                slot.stored.lock().degraded = true;

                match slot.younger_than(self.policy.staleness_ceiling) {
                    Some(snapshot) => {
                        warn!(
                            ticker = %ticker,
                            provider = self.fetcher.name(),
                            error = %e,
                            fetched_at = %snapshot.fetched_at,
                            "Price refresh failed, serving stale snapshot"
                        );
                        Ok(CachedPrice {
                            snapshot,
                            stale: true,
                        })
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Inspect a ticker's cached price without fetching.
    #[must_use]
    pub fn status(&self, ticker: &Ticker) -> CacheStatus {
        let Some(slot) = self.slots.get(ticker).map(|s| s.value().clone()) else {
            return CacheStatus {
                snapshot: None,
                stale: true,
            };
        };

        let stored = slot.stored.lock();
        let expired = stored
            .stored_at
            .map_or(true, |at| at.elapsed() >= self.policy.ttl);
        CacheStatus {
            snapshot: stored.snapshot.clone(),
            stale: stored.degraded || expired,
        }
    }

    /// Drop a ticker's cached price.
    pub fn invalidate(&self, ticker: &Ticker) {
        if self.slots.remove(ticker).is_some() {
            debug!(ticker = %ticker, "Price cache entry invalidated");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::outbound::price::FetchedPrice;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a fixed script of results, then keeps failing.
    struct ScriptFetcher {
        script: Mutex<VecDeque<Option<Decimal>>>,
        calls: AtomicUsize,
    }

    impl ScriptFetcher {
        fn new(script: Vec<Option<Decimal>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceFetcher for ScriptFetcher {
        fn name(&self) -> &'static str {
            "script"
        }

        async fn fetch(&self, ticker: &Ticker) -> Result<FetchedPrice, PriceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().pop_front().flatten() {
                Some(price) => Ok(FetchedPrice::new(price)),
                None => Err(PriceError::unavailable(ticker, "scripted failure")),
            }
        }
    }

    fn cache(fetcher: Arc<ScriptFetcher>) -> PriceCache {
        PriceCache::new(
            fetcher,
            Arc::new(RateLimiter::unlimited()),
            CachePolicy {
                ttl: Duration::from_secs(60),
                staleness_ceiling: Duration::from_secs(600),
            },
        )
    }

    fn aapl() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl_skips_fetch() {
        let fetcher = Arc::new(ScriptFetcher::new(vec![Some(dec!(100)), Some(dec!(101))]));
        let cache = cache(fetcher.clone());

        let first = cache.get(&aapl()).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let second = cache.get(&aapl()).await.unwrap();

        assert_eq!(first.snapshot.price, dec!(100));
        assert_eq!(second.snapshot.price, dec!(100));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_refetches() {
        let fetcher = Arc::new(ScriptFetcher::new(vec![Some(dec!(100)), Some(dec!(105))]));
        let cache = cache(fetcher.clone());

        cache.get(&aapl()).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        let refreshed = cache.get(&aapl()).await.unwrap();

        assert_eq!(refreshed.snapshot.price, dec!(105));
        assert!(!refreshed.stale);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_serves_stale_within_ceiling() {
        let fetcher = Arc::new(ScriptFetcher::new(vec![Some(dec!(100))]));
        let cache = cache(fetcher);

        cache.get(&aapl()).await.unwrap();
        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(61)).await;
            let served = cache.get(&aapl()).await.unwrap();
            assert!(served.stale);
            assert_eq!(served.snapshot.price, dec!(100));
        }
        assert!(cache.status(&aapl()).stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_past_ceiling() {
        let fetcher = Arc::new(ScriptFetcher::new(vec![Some(dec!(100))]));
        let cache = cache(fetcher);

        cache.get(&aapl()).await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        assert!(matches!(
            cache.get(&aapl()).await,
            Err(PriceError::Unavailable { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let fetcher = Arc::new(ScriptFetcher::new(vec![Some(dec!(100)), Some(dec!(99))]));
        let cache = cache(fetcher.clone());

        cache.get(&aapl()).await.unwrap();
        cache.invalidate(&aapl());
        assert!(cache.status(&aapl()).snapshot.is_none());

        let again = cache.get(&aapl()).await.unwrap();
        assert_eq!(again.snapshot.price, dec!(99));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_clears_degraded_flag() {
        let fetcher = Arc::new(ScriptFetcher::new(vec![Some(dec!(100)), None, Some(dec!(102))]));
        let cache = cache(fetcher);

        cache.get(&aapl()).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get(&aapl()).await.unwrap().stale);
        let recovered = cache.get(&aapl()).await.unwrap();
        assert!(!recovered.stale);
        assert!(!cache.status(&aapl()).stale);
    }
}
