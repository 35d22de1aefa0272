//! Stateless trading outlook for a single ticker.
//!
//! Unlike the alert state machine, the outlook reports every signal that
//! holds at the current price and never remembers anything.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::rule::ThresholdRule;
use super::ticker::Ticker;

/// Distance from a support/resistance level that counts as "near" (1%).
const LEVEL_PROXIMITY: Decimal = dec!(0.01);

/// A signal that holds at the observed price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    StrongBuy { level: Decimal },
    Buy { level: Decimal },
    StrongSell { level: Decimal },
    Sell { level: Decimal },
    NearSupport { level: Decimal },
    NearResistance { level: Decimal },
}

/// Signals for one ticker at one price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outlook {
    pub ticker: Ticker,
    pub price: Decimal,
    pub signals: Vec<Signal>,
    pub description: String,
}

impl Outlook {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Compute the outlook for `price` under `rule`.
///
/// Strong levels take precedence over the plain limit on the same side.
#[must_use]
pub fn outlook(rule: &ThresholdRule, price: Decimal) -> Outlook {
    let mut signals = Vec::new();

    match (rule.strong_buy(), rule.below()) {
        (Some(level), _) if price <= level => signals.push(Signal::StrongBuy { level }),
        (_, Some(level)) if price <= level => signals.push(Signal::Buy { level }),
        _ => {}
    }

    match (rule.strong_sell(), rule.above()) {
        (Some(level), _) if price >= level => signals.push(Signal::StrongSell { level }),
        (_, Some(level)) if price >= level => signals.push(Signal::Sell { level }),
        _ => {}
    }

    for &level in rule.support_levels() {
        if near(price, level) {
            signals.push(Signal::NearSupport { level });
        }
    }
    for &level in rule.resistance_levels() {
        if near(price, level) {
            signals.push(Signal::NearResistance { level });
        }
    }

    Outlook {
        ticker: rule.ticker().clone(),
        price,
        signals,
        description: rule.description().to_string(),
    }
}

fn near(price: Decimal, level: Decimal) -> bool {
    (price - level).abs() <= level * LEVEL_PROXIMITY
}
