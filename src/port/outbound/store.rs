//! Persistence ports for the portfolio, alert states and threshold rules.

use async_trait::async_trait;

use crate::domain::alert::AlertState;
use crate::domain::portfolio::PortfolioEntry;
use crate::domain::rule::SectorRules;
use crate::error::{ConfigError, PersistenceError};

/// Durable storage for the tracked-ticker set.
#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    /// Load every persisted entry.
    async fn load(&self) -> Result<Vec<PortfolioEntry>, PersistenceError>;

    /// Replace the persisted set. Must be durable when this returns `Ok`.
    async fn save(&self, entries: &[PortfolioEntry]) -> Result<(), PersistenceError>;
}

/// Durable storage for per-ticker alert states, so a fired crossing stays
/// fired across processes.
#[async_trait]
pub trait AlertStateRepository: Send + Sync {
    async fn load(&self) -> Result<Vec<AlertState>, PersistenceError>;

    /// Replace the persisted states.
    async fn save(&self, states: &[AlertState]) -> Result<(), PersistenceError>;
}

/// Source of the sector-grouped threshold configuration.
pub trait RuleSource: Send + Sync {
    /// Where the rules come from, for logs.
    fn describe(&self) -> String;

    /// Read and parse the raw rule layout.
    fn load(&self) -> Result<SectorRules, ConfigError>;
}
