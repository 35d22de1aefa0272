//! Handlers for `add`, `remove` and `list`.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::session::Session;
use crate::error::Result;
use crate::port::inbound::monitor::{MonitorApi, PortfolioChange};

#[derive(Tabled)]
struct PortfolioRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Sector")]
    sector: String,
    #[tabled(rename = "Buy ≤")]
    below: String,
    #[tabled(rename = "Sell ≥")]
    above: String,
    #[tabled(rename = "Added")]
    added: String,
}

/// Start tracking a ticker.
pub async fn add(session: &Session, ticker: &str) -> Result<()> {
    let change = session.engine.add_ticker(ticker).await?;
    print_change("portfolio.add", &change, "Added", "already tracked");

    if change.changed && session.engine.context().rules.rule(&change.ticker).is_none() {
        output::warning(&format!(
            "No threshold rule for {}, it will be skipped until one is configured",
            change.ticker
        ));
    }
    Ok(())
}

/// Stop tracking a ticker.
pub async fn remove(session: &Session, ticker: &str) -> Result<()> {
    let change = session.engine.remove_ticker(ticker).await?;
    print_change("portfolio.remove", &change, "Removed", "not tracked");
    Ok(())
}

fn print_change(command: &str, change: &PortfolioChange, verb: &str, noop: &str) {
    if output::is_json() {
        output::document(&json!({
            "command": command,
            "ticker": change.ticker,
            "changed": change.changed,
            "tickers": change.tickers,
        }));
        return;
    }

    if change.changed {
        output::success(&format!("{verb} {}", output::ticker(&change.ticker)));
    } else {
        output::note(&format!("{} {noop}", change.ticker));
    }
    output::field("Portfolio", format!("{} ticker(s)", change.tickers.len()));
}

/// List tracked tickers with their thresholds.
pub async fn list(session: &Session) -> Result<()> {
    let entries = session.engine.list_portfolio().await;

    if output::is_json() {
        output::document(&json!({
            "command": "portfolio.list",
            "entries": entries,
        }));
        return Ok(());
    }

    output::banner();
    if entries.is_empty() {
        output::note("Portfolio is empty");
        output::hint("add a ticker with `tickwatch add <TICKER>`");
        return Ok(());
    }

    let rules = session.engine.context().rules.snapshot();
    let rows: Vec<PortfolioRow> = entries
        .iter()
        .map(|entry| {
            let rule = rules.get(&entry.ticker);
            PortfolioRow {
                ticker: entry.ticker.to_string(),
                sector: rule.map_or_else(|| "-".to_string(), |r| r.sector().to_string()),
                below: output::price(rule.and_then(|r| r.below())),
                above: output::price(rule.and_then(|r| r.above())),
                added: entry.added_at.format("%Y-%m-%d %H:%M").to_string(),
            }
        })
        .collect();

    output::section(&format!("Portfolio ({})", entries.len()));
    output::table(rows);
    Ok(())
}
