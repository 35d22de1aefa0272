//! In-memory repositories.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::alert::AlertState;
use crate::domain::portfolio::PortfolioEntry;
use crate::domain::ticker::Ticker;
use crate::error::PersistenceError;
use crate::port::outbound::store::{AlertStateRepository, PortfolioRepository};

/// Keeps the portfolio in memory. Saves can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryPortfolioStore {
    entries: Mutex<Vec<PortfolioEntry>>,
    fail_saves: AtomicBool,
}

impl MemoryPortfolioStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entries(entries: Vec<PortfolioEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Make every following save fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Tickers as last saved.
    #[must_use]
    pub fn tickers(&self) -> Vec<Ticker> {
        self.entries.lock().iter().map(|e| e.ticker.clone()).collect()
    }
}

#[async_trait]
impl PortfolioRepository for MemoryPortfolioStore {
    async fn load(&self) -> Result<Vec<PortfolioEntry>, PersistenceError> {
        Ok(self.entries.lock().clone())
    }

    async fn save(&self, entries: &[PortfolioEntry]) -> Result<(), PersistenceError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("memory store is failing saves".into()));
        }
        *self.entries.lock() = entries.to_vec();
        Ok(())
    }
}

/// Keeps alert states in memory, shared by every tracker handed the same
/// instance.
#[derive(Debug, Default)]
pub struct MemoryAlertStore {
    states: Mutex<Vec<AlertState>>,
    fail_saves: AtomicBool,
}

impl MemoryAlertStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// States as last saved.
    #[must_use]
    pub fn states(&self) -> Vec<AlertState> {
        self.states.lock().clone()
    }
}

#[async_trait]
impl AlertStateRepository for MemoryAlertStore {
    async fn load(&self) -> Result<Vec<AlertState>, PersistenceError> {
        Ok(self.states.lock().clone())
    }

    async fn save(&self, states: &[AlertState]) -> Result<(), PersistenceError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("memory store is failing saves".into()));
        }
        *self.states.lock() = states.to_vec();
        Ok(())
    }
}
