//! Threshold configuration store.
//!
//! Holds the active [`RuleSet`] behind an `Arc` that is swapped whole on
//! reload. Readers take a snapshot and keep using it for the rest of their
//! work; they never observe a half-applied reload.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain::rule::{RuleSet, ThresholdRule};
use crate::domain::ticker::Ticker;
use crate::error::ConfigError;
use crate::port::outbound::store::RuleSource;

/// Reloadable, read-mostly rule store.
pub struct RuleBook {
    source: Box<dyn RuleSource>,
    active: RwLock<Arc<RuleSet>>,
}

impl RuleBook {
    /// Load the initial rule set.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] here is fatal: there is no previous set to fall
    /// back on.
    pub fn load(source: Box<dyn RuleSource>) -> Result<Self, ConfigError> {
        let rules = RuleSet::from_sectors(source.load()?)?;
        info!(source = %source.describe(), rules = rules.len(), "Threshold rules loaded");
        Ok(Self {
            source,
            active: RwLock::new(Arc::new(rules)),
        })
    }

    /// Re-read the source and swap in the new set.
    ///
    /// # Errors
    ///
    /// On failure the previous set stays active and the error is returned
    /// after being logged.
    pub fn reload(&self) -> Result<usize, ConfigError> {
        let loaded = self.source.load().and_then(RuleSet::from_sectors);
        match loaded {
            Ok(rules) => {
                let count = rules.len();
                *self.active.write() = Arc::new(rules);
                info!(source = %self.source.describe(), rules = count, "Threshold rules reloaded");
                Ok(count)
            }
            Err(e) => {
                warn!(
                    source = %self.source.describe(),
                    error = %e,
                    "Threshold reload rejected, keeping previous rules"
                );
                Err(e)
            }
        }
    }

    /// The active set. Cheap: clones an `Arc`.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.active.read().clone()
    }

    /// Look up one rule in the active set.
    #[must_use]
    pub fn rule(&self, ticker: &Ticker) -> Option<ThresholdRule> {
        self.active.read().get(ticker).cloned()
    }
}
