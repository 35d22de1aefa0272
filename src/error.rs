use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::ticker::Ticker;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("failed to read threshold rules from {path}: {source}")]
    RulesRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse threshold rules: {0}")]
    RulesParse(#[source] serde_json::Error),

    #[error("invalid threshold rule for {ticker}: {source}")]
    InvalidRule {
        ticker: String,
        #[source]
        source: DomainError,
    },

    #[error("ticker {ticker} is configured in both {first} and {second}")]
    DuplicateRule {
        ticker: String,
        first: String,
        second: String,
    },

    #[error("missing required environment variable {name}")]
    MissingSecret { name: &'static str },
}

/// Price retrieval errors, always local to one ticker.
#[derive(Error, Debug, Clone)]
pub enum PriceError {
    #[error("price unavailable for {ticker}: {reason}")]
    Unavailable { ticker: Ticker, reason: String },

    #[error("price fetch for {ticker} timed out")]
    Timeout { ticker: Ticker },
}

impl PriceError {
    /// Build an `Unavailable` error from any displayable cause.
    pub fn unavailable(ticker: &Ticker, reason: impl ToString) -> Self {
        Self::Unavailable {
            ticker: ticker.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Notification delivery errors, classified for the retry policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Network or timeout failure; worth retrying.
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// Bad credentials or target; retrying cannot help.
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

impl DispatchError {
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
}

/// Portfolio persistence errors. A failed commit means the mutation was not applied.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("portfolio storage I/O failed at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("portfolio file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("portfolio storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("{0} is not in the portfolio")]
    NotTracked(Ticker),

    #[error("no threshold rule configured for {0}")]
    NoRule(Ticker),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
