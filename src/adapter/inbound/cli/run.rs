//! Handler for the `run` command.

use std::time::Duration;

use serde_json::json;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

use crate::adapter::inbound::cli::alerts::print_report;
use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::session::{self, Session};
use crate::error::Result;
use crate::infrastructure::runtime::{self, RuntimeSchedule};
use crate::port::inbound::monitor::CycleReport;

/// Execute the run command. Returns once Ctrl-C is received.
pub async fn execute(explicit: Option<&std::path::Path>, args: &RunArgs) -> Result<()> {
    let (mut config, origin) = session::load_config(explicit)?;
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs || output::is_json() {
        config.logging.format = "json".to_string();
    }

    let session = Session::with_config(config, origin).await?;
    print_startup(&session).await;

    let schedule = RuntimeSchedule {
        cycle_interval: session.config.monitor.interval(),
        rules_reload: session.config.monitor.rules_reload_interval(),
    };

    let (stop, stopped) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
        let _ = stop.send(true);
    });

    runtime::run_until_shutdown(session.engine.clone(), schedule, stopped, on_cycle).await?;
    output::success("Stopped");
    Ok(())
}

fn on_cycle(report: &CycleReport) {
    if output::is_json() {
        output::document(&json!({
            "command": "alerts.cycle",
            "report": report,
        }));
    } else if !report.alerts.is_empty() || report.cancelled {
        print_report(report);
    }
}

async fn print_startup(session: &Session) {
    let config = &session.config;
    let tickers = session.engine.context().portfolio.tickers().await;

    output::banner();
    output::field("Config", &session.origin);
    output::field("Tickers", tickers.len());
    output::field(
        "Interval",
        humanize(config.monitor.interval()),
    );
    output::field("Workers", config.monitor.workers);
    output::field(
        "Notify",
        if config.telegram.enabled {
            "telegram"
        } else {
            "log"
        },
    );

    if tickers.is_empty() {
        output::warning("Portfolio is empty, nothing will be monitored");
    }
}

fn humanize(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(Duration::from_secs(60)), "1m");
        assert_eq!(humanize(Duration::from_secs(90)), "90s");
        assert_eq!(humanize(Duration::from_secs(300)), "5m");
    }
}
