//! Domain validation errors.
//!
//! Returned by constructors that enforce the invariants of tickers and
//! threshold rules before they reach the evaluator.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Tickers must be non-empty ASCII letters, digits and `.-^=`.
    #[error("invalid ticker {raw:?}")]
    InvalidTicker {
        /// The rejected input.
        raw: String,
    },

    /// A rule needs at least one of `above` / `below`.
    #[error("rule must set at least one of above/below")]
    NoLimits,

    /// The sell limit must sit strictly above the buy limit.
    #[error("above {above} must be greater than below {below}")]
    InvertedLimits {
        /// Configured upper limit.
        above: Decimal,
        /// Configured lower limit.
        below: Decimal,
    },

    /// Prices and levels must be positive.
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Which rule field was rejected.
        field: &'static str,
        /// The rejected value.
        value: Decimal,
    },

    /// `strong_buy` must not exceed `below`.
    #[error("strong_buy {strong_buy} must not exceed below {below}")]
    StrongBuyAboveBelow {
        /// Configured strong buy level.
        strong_buy: Decimal,
        /// Configured buy limit.
        below: Decimal,
    },

    /// `strong_sell` must not be under `above`.
    #[error("strong_sell {strong_sell} must not be under above {above}")]
    StrongSellBelowAbove {
        /// Configured strong sell level.
        strong_sell: Decimal,
        /// Configured sell limit.
        above: Decimal,
    },
}
