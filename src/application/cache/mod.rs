//! Runtime caches used by application services.
//!
//! - [`price::PriceCache`]: last-seen price per ticker with TTL and stale-serving

pub mod price;

pub use price::{CachePolicy, CachedPrice, CacheStatus, PriceCache};
