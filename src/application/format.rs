//! Plain-text rendering of notifications.

use crate::domain::alert::{AlertEvent, Direction};
use crate::domain::outlook::{Outlook, Signal};

/// Header used when a cycle's events are sent as one message.
pub const DEFAULT_SUMMARY_HEADER: &str = "💰 Trading Signals Alert";

/// Render a single alert event.
#[must_use]
pub fn alert_message(event: &AlertEvent) -> String {
    let mut msg = match event.direction {
        Direction::Above => format!(
            "🔴 Sell Signal: {} at ${}\n• Price at/above sell threshold ${}",
            event.ticker, event.price, event.threshold
        ),
        Direction::Below => format!(
            "🟢 Buy Signal: {} at ${}\n• Price at/below buy threshold ${}",
            event.ticker, event.price, event.threshold
        ),
    };
    if !event.description.is_empty() {
        msg.push_str("\nNote: ");
        msg.push_str(&event.description);
    }
    msg
}

/// Render several events as one summary message.
#[must_use]
pub fn batch_message(header: &str, events: &[AlertEvent]) -> String {
    let body: Vec<String> = events.iter().map(alert_message).collect();
    format!("{header}:\n\n{}", body.join("\n\n"))
}

fn signal_lines(ticker: &str, price: &str, signal: &Signal) -> Vec<String> {
    match signal {
        Signal::StrongBuy { level } => vec![
            format!("🟢 Strong Buy Signal for {ticker} at ${price}"),
            format!("• Price at/below strong buy level ${level}"),
        ],
        Signal::Buy { level } => vec![
            format!("🟢 Buy Signal for {ticker} at ${price}"),
            format!("• Price at/below buy threshold ${level}"),
        ],
        Signal::StrongSell { level } => vec![
            format!("🔴 Strong Sell Signal for {ticker} at ${price}"),
            format!("• Price at/above strong sell level ${level}"),
        ],
        Signal::Sell { level } => vec![
            format!("🔴 Sell Signal for {ticker} at ${price}"),
            format!("• Price at/above sell threshold ${level}"),
        ],
        Signal::NearSupport { level } => {
            vec![format!("📊 Near support level ${level} (potential buy zone)")]
        }
        Signal::NearResistance { level } => {
            vec![format!("📊 Near resistance level ${level} (potential sell zone)")]
        }
    }
}

/// Render a trading outlook.
#[must_use]
pub fn outlook_message(outlook: &Outlook) -> String {
    let ticker = outlook.ticker.as_str();
    let price = outlook.price.to_string();

    let mut lines: Vec<String> = outlook
        .signals
        .iter()
        .flat_map(|signal| signal_lines(ticker, &price, signal))
        .collect();

    if lines.is_empty() {
        lines.push(format!(
            "ℹ️ No immediate trading opportunities for {ticker} at ${price}"
        ));
    } else if !outlook.description.is_empty() {
        lines.push(format!("\nNote: {}", outlook.description));
    }

    format!("💰 Trading Opportunities for {ticker}:\n\n{}", lines.join("\n"))
}
