//! Pure domain logic: tickers, threshold rules, prices, and alert evaluation.

pub mod alert;
pub mod error;
pub mod outlook;
pub mod portfolio;
pub mod price;
pub mod rule;
pub mod ticker;

pub use alert::{evaluate, AlertEvent, AlertState, Direction, Evaluation, EvaluationPolicy, Verdict};
pub use outlook::{outlook, Outlook, Signal};
pub use portfolio::PortfolioEntry;
pub use price::PriceSnapshot;
pub use rule::{RawRule, RuleSet, SectorRules, ThresholdRule};
pub use ticker::Ticker;
