//! Shared request pacing for the price provider.
//!
//! Every worker draws from one budget, so raising the worker count never
//! raises the request rate seen by the provider.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Longest spacing between two requests.
pub const MAX_INTERVAL: Duration = Duration::from_secs(3600);

/// Spaces acquisitions at least `interval` apart across all callers.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Limit to `per_second` acquisitions per second. Zero or negative disables pacing.
    ///
    /// A rate too small to express as an interval is clamped to one request
    /// per [`MAX_INTERVAL`].
    #[must_use]
    pub fn per_second(per_second: f64) -> Self {
        let interval = if per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / per_second)
                .map_or(MAX_INTERVAL, |interval| interval.min(MAX_INTERVAL))
        } else {
            Duration::ZERO
        };
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn unlimited() -> Self {
        Self::per_second(0.0)
    }

    /// Wait for the next free slot.
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next.map_or(now, |reserved| reserved.max(now));
            *next = Some(slot + self.interval);
            slot
        };
        sleep_until(slot).await;
    }
}
