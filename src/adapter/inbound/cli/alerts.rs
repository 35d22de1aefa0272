//! Handlers for `check`, `cycle` and `outlook`.

use chrono::{DateTime, Utc};
use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::session::Session;
use crate::application::format;
use crate::domain::ticker::Ticker;
use crate::error::Result;
use crate::port::inbound::monitor::{AlertStatus, CycleReport, MonitorApi};

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Fired At")]
    fired_at: String,
    #[tabled(rename = "Fired Price")]
    fired_price: String,
    #[tabled(rename = "Last Price")]
    last_price: String,
}

fn time(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

impl From<&AlertStatus> for AlertRow {
    fn from(status: &AlertStatus) -> Self {
        Self {
            ticker: status.ticker.to_string(),
            state: output::alert_state(status.direction),
            fired_at: time(status.last_fired_at),
            fired_price: output::price(status.fired_price),
            last_price: output::price_with_age(status.last_price, status.stale),
        }
    }
}

fn join(tickers: &[Ticker]) -> String {
    tickers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Show fired alerts, or one ticker's state.
pub async fn check(session: &Session, ticker: Option<&str>) -> Result<()> {
    let statuses = session.engine.check_alerts(ticker).await?;

    if output::is_json() {
        output::document(&json!({
            "command": "alerts.check",
            "alerts": statuses,
        }));
        return Ok(());
    }

    output::banner();
    if statuses.is_empty() {
        output::note("No active alerts");
        return Ok(());
    }

    output::section("Alerts");
    output::table(statuses.iter().map(AlertRow::from));
    Ok(())
}

/// Run one cycle now and print its report.
pub async fn cycle(session: &Session) -> Result<()> {
    let report = session.engine.run_cycle_now().await?;

    if output::is_json() {
        output::document(&json!({
            "command": "alerts.cycle",
            "report": report,
        }));
        return Ok(());
    }

    output::banner();
    print_report(&report);
    Ok(())
}

/// Human-readable cycle report, shared with `run`.
pub fn print_report(report: &CycleReport) {
    output::section("Cycle");
    output::field("Evaluated", report.evaluated);
    output::field("Alerts", report.alerts.len());
    output::field("Delivered", report.delivered);
    output::field("Duration", format!("{} ms", report.duration_ms));

    for event in &report.alerts {
        output::alert(event);
    }

    if !report.skipped_no_rule.is_empty() {
        output::note(&format!("No rule: {}", join(&report.skipped_no_rule)));
    }
    if !report.unavailable.is_empty() {
        output::warning(&format!("Price unavailable: {}", join(&report.unavailable)));
    }
    if !report.timed_out.is_empty() {
        output::warning(&format!("Timed out: {}", join(&report.timed_out)));
    }
    if report.dispatch_failures > 0 {
        output::warning(&format!(
            "{} notification(s) failed, {} escalated",
            report.dispatch_failures, report.escalations
        ));
    }
    if report.cancelled {
        output::warning("Cycle cancelled before every ticker finished");
    }
}

/// Show the trading outlook for a ticker, optionally sending it.
pub async fn outlook(session: &Session, ticker: &str, send: bool) -> Result<()> {
    let report = session.engine.trading_outlook(ticker, send).await?;

    if output::is_json() {
        output::document(&json!({
            "command": "alerts.outlook",
            "outlook": report.outlook,
            "stale": report.stale,
            "dispatched": report.dispatched,
        }));
        return Ok(());
    }

    output::banner();
    output::block(&format::outlook_message(&report.outlook));
    if report.stale {
        output::warning("Price is stale, the provider did not answer");
    }
    match report.dispatched {
        Some(true) => output::success("Outlook sent"),
        Some(false) => output::warning("Outlook could not be delivered"),
        None => {}
    }
    Ok(())
}
