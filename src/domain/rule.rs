//! Threshold rules and the validated rule set.
//!
//! The on-disk layout is `sector -> ticker -> rule`. Loading flattens it into
//! a [`RuleSet`] keyed by ticker, rejecting anything the evaluator could not
//! act on.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::ticker::Ticker;
use crate::error::ConfigError;

/// Rule fields as they appear in the threshold file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRule {
    #[serde(default)]
    pub above: Option<Decimal>,
    #[serde(default)]
    pub below: Option<Decimal>,
    /// Required; may be empty.
    pub description: String,
    #[serde(default)]
    pub strong_buy: Option<Decimal>,
    #[serde(default)]
    pub strong_sell: Option<Decimal>,
    #[serde(default)]
    pub support_levels: Vec<Decimal>,
    #[serde(default)]
    pub resistance_levels: Vec<Decimal>,
}

/// Threshold file contents: sector name to ticker to rule.
pub type SectorRules = BTreeMap<String, BTreeMap<String, RawRule>>;

/// A validated price-threshold rule for one ticker.
///
/// Invariant: at least one of `above` / `below` is set, and `above > below`
/// when both are. Rules are replaced wholesale on reload, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdRule {
    ticker: Ticker,
    sector: String,
    above: Option<Decimal>,
    below: Option<Decimal>,
    description: String,
    strong_buy: Option<Decimal>,
    strong_sell: Option<Decimal>,
    support_levels: Vec<Decimal>,
    resistance_levels: Vec<Decimal>,
}

impl ThresholdRule {
    /// Create a rule with only the band limits.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if neither limit is set, a limit is not
    /// positive, or `above <= below`.
    pub fn try_new(
        ticker: Ticker,
        sector: impl Into<String>,
        above: Option<Decimal>,
        below: Option<Decimal>,
        description: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let raw = RawRule {
            above,
            below,
            description: description.into(),
            ..RawRule::default()
        };
        Self::from_raw(ticker, sector, raw)
    }

    /// Validate a raw rule from the threshold file.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] describing the first violated invariant.
    pub fn from_raw(
        ticker: Ticker,
        sector: impl Into<String>,
        raw: RawRule,
    ) -> Result<Self, DomainError> {
        if raw.above.is_none() && raw.below.is_none() {
            return Err(DomainError::NoLimits);
        }

        let singles = [
            ("above", raw.above),
            ("below", raw.below),
            ("strong_buy", raw.strong_buy),
            ("strong_sell", raw.strong_sell),
        ];
        for (field, value) in singles {
            if let Some(value) = value {
                ensure_positive(field, value)?;
            }
        }
        for &level in &raw.support_levels {
            ensure_positive("support_levels", level)?;
        }
        for &level in &raw.resistance_levels {
            ensure_positive("resistance_levels", level)?;
        }

        if let (Some(above), Some(below)) = (raw.above, raw.below) {
            if above <= below {
                return Err(DomainError::InvertedLimits { above, below });
            }
        }
        if let (Some(strong_buy), Some(below)) = (raw.strong_buy, raw.below) {
            if strong_buy > below {
                return Err(DomainError::StrongBuyAboveBelow { strong_buy, below });
            }
        }
        if let (Some(strong_sell), Some(above)) = (raw.strong_sell, raw.above) {
            if strong_sell < above {
                return Err(DomainError::StrongSellBelowAbove { strong_sell, above });
            }
        }

        Ok(Self {
            ticker,
            sector: sector.into(),
            above: raw.above,
            below: raw.below,
            description: raw.description,
            strong_buy: raw.strong_buy,
            strong_sell: raw.strong_sell,
            support_levels: raw.support_levels,
            resistance_levels: raw.resistance_levels,
        })
    }

    #[must_use]
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    #[must_use]
    pub fn sector(&self) -> &str {
        &self.sector
    }

    #[must_use]
    pub const fn above(&self) -> Option<Decimal> {
        self.above
    }

    #[must_use]
    pub const fn below(&self) -> Option<Decimal> {
        self.below
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn strong_buy(&self) -> Option<Decimal> {
        self.strong_buy
    }

    #[must_use]
    pub const fn strong_sell(&self) -> Option<Decimal> {
        self.strong_sell
    }

    #[must_use]
    pub fn support_levels(&self) -> &[Decimal] {
        &self.support_levels
    }

    #[must_use]
    pub fn resistance_levels(&self) -> &[Decimal] {
        &self.resistance_levels
    }
}

fn ensure_positive(field: &'static str, value: Decimal) -> Result<(), DomainError> {
    if value <= Decimal::ZERO {
        return Err(DomainError::NonPositive { field, value });
    }
    Ok(())
}

/// Immutable, validated set of rules keyed by ticker.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<Ticker, ThresholdRule>,
}

impl RuleSet {
    /// Flatten and validate the sector layout.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid ticker symbol, invalid rule, or ticker
    /// configured under more than one sector.
    pub fn from_sectors(sectors: SectorRules) -> Result<Self, ConfigError> {
        let mut rules: BTreeMap<Ticker, ThresholdRule> = BTreeMap::new();

        for (sector, entries) in sectors {
            for (symbol, raw) in entries {
                let ticker = Ticker::parse(&symbol).map_err(|source| ConfigError::InvalidRule {
                    ticker: symbol.clone(),
                    source,
                })?;

                if let Some(existing) = rules.get(&ticker) {
                    return Err(ConfigError::DuplicateRule {
                        ticker: ticker.to_string(),
                        first: existing.sector().to_string(),
                        second: sector,
                    });
                }

                let rule = ThresholdRule::from_raw(ticker.clone(), sector.clone(), raw).map_err(
                    |source| ConfigError::InvalidRule {
                        ticker: ticker.to_string(),
                        source,
                    },
                )?;
                rules.insert(ticker, rule);
            }
        }

        Ok(Self { rules })
    }

    /// Build a set directly from validated rules.
    #[must_use]
    pub fn from_rules(rules: impl IntoIterator<Item = ThresholdRule>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| (rule.ticker().clone(), rule))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, ticker: &Ticker) -> Option<&ThresholdRule> {
        self.rules.get(ticker)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThresholdRule> {
        self.rules.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
