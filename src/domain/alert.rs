//! Alert hysteresis state machine.
//!
//! Each ticker is in one of three states: armed with nothing fired, above
//! limit fired, or below limit fired. A fired state only re-arms once price
//! re-enters the neutral band `below < p < above`, so a price sitting on or
//! beyond a limit produces exactly one notification.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::rule::ThresholdRule;
use super::ticker::Ticker;

/// Which limit a price crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Above => write!(f, "above"),
            Self::Below => write!(f, "below"),
        }
    }
}

/// Per-ticker record of the last notified crossing.
///
/// `direction` reflects the last crossing that produced an event, not the
/// last evaluated price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    pub ticker: Ticker,
    pub direction: Option<Direction>,
    /// False while waiting for the first in-band observation.
    pub armed: bool,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub fired_price: Option<Decimal>,
    pub last_price: Option<Decimal>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl AlertState {
    #[must_use]
    pub fn new(ticker: Ticker, armed: bool) -> Self {
        Self {
            ticker,
            direction: None,
            armed,
            last_fired_at: None,
            fired_price: None,
            last_price: None,
            evaluated_at: None,
        }
    }

    #[must_use]
    pub const fn is_fired(&self) -> bool {
        self.direction.is_some()
    }
}

/// A threshold crossing to be dispatched once. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertEvent {
    pub ticker: Ticker,
    pub direction: Direction,
    pub price: Decimal,
    pub threshold: Decimal,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Tunables for the state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationPolicy {
    /// Minimum time between two events for one ticker, on top of re-arming.
    pub cooldown: Option<Duration>,
    /// Start new tickers disarmed: the first alert needs an in-band
    /// observation first, so a ticker already past a limit when first seen
    /// stays quiet.
    pub baseline_first_observation: bool,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Price is in the band, or the state is waiting to arm.
    NoAlert,
    /// A new crossing to notify.
    NewAlert(AlertEvent),
    /// Price is still beyond the limit already notified, or inside the cooldown.
    Suppressed,
}

/// Verdict plus the state to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub next: AlertState,
}

/// Evaluate `price` against `rule` given the prior state.
///
/// Pure: the caller commits `next` and dispatches the event, if any.
#[must_use]
pub fn evaluate(
    prior: Option<&AlertState>,
    rule: &ThresholdRule,
    price: Decimal,
    now: DateTime<Utc>,
    policy: &EvaluationPolicy,
) -> Evaluation {
    let mut next = prior.cloned().unwrap_or_else(|| {
        AlertState::new(rule.ticker().clone(), !policy.baseline_first_observation)
    });
    next.last_price = Some(price);
    next.evaluated_at = Some(now);

    let verdict = match (next.direction, crossing(rule, price)) {
        (_, None) => {
            next.direction = None;
            next.armed = true;
            Verdict::NoAlert
        }
        (Some(current), Some((direction, _))) if current == direction => Verdict::Suppressed,
        (None, Some(_)) if !next.armed => Verdict::NoAlert,
        (_, Some((direction, threshold))) => {
            if in_cooldown(&next, now, policy) {
                Verdict::Suppressed
            } else {
                next.direction = Some(direction);
                next.last_fired_at = Some(now);
                next.fired_price = Some(price);
                Verdict::NewAlert(AlertEvent {
                    ticker: rule.ticker().clone(),
                    direction,
                    price,
                    threshold,
                    description: rule.description().to_string(),
                    timestamp: now,
                })
            }
        }
    };

    Evaluation { verdict, next }
}

/// The limit `price` is at or beyond, if any. `above > below` makes this unique.
fn crossing(rule: &ThresholdRule, price: Decimal) -> Option<(Direction, Decimal)> {
    if let Some(above) = rule.above() {
        if price >= above {
            return Some((Direction::Above, above));
        }
    }
    if let Some(below) = rule.below() {
        if price <= below {
            return Some((Direction::Below, below));
        }
    }
    None
}

fn in_cooldown(state: &AlertState, now: DateTime<Utc>, policy: &EvaluationPolicy) -> bool {
    match (policy.cooldown, state.last_fired_at) {
        (Some(cooldown), Some(fired)) => now - fired < cooldown,
        _ => false,
    }
}
