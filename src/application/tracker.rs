//! Alert state table.
//!
//! Evaluation and commit happen together under the ticker's map entry, with
//! no await in between, so a cancelled cycle can never leave a state
//! half-updated or split from the event it produced.
//!
//! With a repository attached, the table is written out after each cycle
//! and read back at startup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::alert::{evaluate, AlertState, EvaluationPolicy, Verdict};
use crate::domain::rule::ThresholdRule;
use crate::domain::ticker::Ticker;
use crate::error::PersistenceError;
use crate::port::outbound::store::AlertStateRepository;

/// Per-ticker alert states.
pub struct AlertTracker {
    states: DashMap<Ticker, AlertState>,
    policy: EvaluationPolicy,
    store: Option<Arc<dyn AlertStateRepository>>,
    /// Orders snapshot-and-save pairs so an older table never overwrites a newer one.
    writing: Mutex<()>,
}

impl Default for AlertTracker {
    fn default() -> Self {
        Self::new(EvaluationPolicy::default())
    }
}

impl AlertTracker {
    /// In-memory only.
    #[must_use]
    pub fn new(policy: EvaluationPolicy) -> Self {
        Self {
            states: DashMap::new(),
            policy,
            store: None,
            writing: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_store(policy: EvaluationPolicy, store: Arc<dyn AlertStateRepository>) -> Self {
        Self {
            store: Some(store),
            ..Self::new(policy)
        }
    }

    /// Load persisted states for `tracked` tickers. States of tickers no
    /// longer tracked are dropped.
    ///
    /// # Errors
    ///
    /// Returns the repository's error if the states cannot be read.
    pub async fn restore(&self, tracked: &[Ticker]) -> Result<usize, PersistenceError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let mut restored = 0;
        for state in store.load().await? {
            if tracked.contains(&state.ticker) {
                self.states.insert(state.ticker.clone(), state);
                restored += 1;
            }
        }
        debug!(restored, "Alert states restored");
        Ok(restored)
    }

    /// Write the current table to the repository. A failed write is logged;
    /// the in-memory states stay authoritative.
    pub async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let _writing = self.writing.lock().await;
        let states = self.snapshot();
        if let Err(e) = store.save(&states).await {
            warn!(error = %e, states = states.len(), "Failed to persist alert states");
        }
    }

    /// Evaluate `price` for the rule's ticker and commit the resulting state.
    pub fn apply(&self, rule: &ThresholdRule, price: Decimal, now: DateTime<Utc>) -> Verdict {
        match self.states.entry(rule.ticker().clone()) {
            Entry::Occupied(mut entry) => {
                let evaluation = evaluate(Some(entry.get()), rule, price, now, &self.policy);
                entry.insert(evaluation.next);
                evaluation.verdict
            }
            Entry::Vacant(entry) => {
                let evaluation = evaluate(None, rule, price, now, &self.policy);
                entry.insert(evaluation.next);
                evaluation.verdict
            }
        }
    }

    #[must_use]
    pub fn get(&self, ticker: &Ticker) -> Option<AlertState> {
        self.states.get(ticker).map(|state| state.value().clone())
    }

    /// Every state, in ticker order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AlertState> {
        let mut states: Vec<AlertState> =
            self.states.iter().map(|state| state.value().clone()).collect();
        states.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        states
    }

    /// States with a fired direction, in ticker order.
    #[must_use]
    pub fn fired(&self) -> Vec<AlertState> {
        let mut fired = self.snapshot();
        fired.retain(AlertState::is_fired);
        fired
    }

    /// Forget a ticker's history. Returns true if a state existed.
    pub fn clear(&self, ticker: &Ticker) -> bool {
        self.states.remove(ticker).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::store::MemoryAlertStore;
    use crate::domain::alert::Direction;
    use rust_decimal_macros::dec;

    fn rule(symbol: &str) -> ThresholdRule {
        ThresholdRule::try_new(
            Ticker::parse(symbol).unwrap(),
            "tech",
            Some(dec!(200)),
            Some(dec!(180)),
            "",
        )
        .unwrap()
    }

    #[test]
    fn test_apply_commits_state() {
        let tracker = AlertTracker::default();
        let aapl = rule("AAPL");

        assert!(matches!(
            tracker.apply(&aapl, dec!(205), Utc::now()),
            Verdict::NewAlert(_)
        ));
        assert_eq!(tracker.apply(&aapl, dec!(206), Utc::now()), Verdict::Suppressed);

        let state = tracker.get(aapl.ticker()).unwrap();
        assert_eq!(state.direction, Some(Direction::Above));
        assert_eq!(state.last_price, Some(dec!(206)));
        assert_eq!(state.fired_price, Some(dec!(205)));
    }

    #[test]
    fn test_clear_resets_history() {
        let tracker = AlertTracker::default();
        let aapl = rule("AAPL");

        tracker.apply(&aapl, dec!(205), Utc::now());
        assert!(tracker.clear(aapl.ticker()));
        assert!(tracker.get(aapl.ticker()).is_none());
        assert!(matches!(
            tracker.apply(&aapl, dec!(205), Utc::now()),
            Verdict::NewAlert(_)
        ));
    }

    #[tokio::test]
    async fn test_persisted_states_survive_a_new_tracker() {
        let store = Arc::new(MemoryAlertStore::new());
        let aapl = rule("AAPL");
        let msft = rule("MSFT");

        let first = AlertTracker::with_store(EvaluationPolicy::default(), store.clone());
        assert!(matches!(first.apply(&aapl, dec!(205), Utc::now()), Verdict::NewAlert(_)));
        first.apply(&msft, dec!(190), Utc::now());
        first.persist().await;

        let second = AlertTracker::with_store(EvaluationPolicy::default(), store);
        let tracked = [aapl.ticker().clone()];
        assert_eq!(second.restore(&tracked).await.unwrap(), 1);
        assert_eq!(second.apply(&aapl, dec!(206), Utc::now()), Verdict::Suppressed);
        assert!(second.get(msft.ticker()).is_none());
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_memory_state() {
        let store = Arc::new(MemoryAlertStore::new());
        store.fail_saves(true);
        let tracker = AlertTracker::with_store(EvaluationPolicy::default(), store.clone());
        let aapl = rule("AAPL");

        tracker.apply(&aapl, dec!(205), Utc::now());
        tracker.persist().await;

        assert!(tracker.get(aapl.ticker()).unwrap().is_fired());
        assert!(store.states().is_empty());
    }

    #[test]
    fn test_fired_lists_only_fired_sorted() {
        let tracker = AlertTracker::default();
        tracker.apply(&rule("MSFT"), dec!(150), Utc::now());
        tracker.apply(&rule("AAPL"), dec!(250), Utc::now());
        tracker.apply(&rule("GOOG"), dec!(190), Utc::now());

        let fired: Vec<String> = tracker
            .fired()
            .into_iter()
            .map(|s| s.ticker.to_string())
            .collect();
        assert_eq!(fired, vec!["AAPL", "MSFT"]);
        assert_eq!(tracker.len(), 3);
    }
}
