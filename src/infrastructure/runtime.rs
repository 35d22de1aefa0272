//! Long-running monitor loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::engine::Engine;
use crate::error::Result;
use crate::port::inbound::monitor::{CycleReport, MonitorApi};

/// Loop timing.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeSchedule {
    pub cycle_interval: Duration,
    /// `None` never reloads rules.
    pub rules_reload: Option<Duration>,
}

/// Run cycles on `schedule` until `shutdown` flips to true or its sender
/// is dropped. A cycle in flight at shutdown is cancelled, not awaited in
/// full.
///
/// `on_cycle` sees every finished cycle's report.
pub async fn run_until_shutdown(
    engine: Arc<Engine>,
    schedule: RuntimeSchedule,
    mut shutdown: watch::Receiver<bool>,
    mut on_cycle: impl FnMut(&CycleReport),
) -> Result<()> {
    info!(
        interval_secs = schedule.cycle_interval.as_secs(),
        reload_secs = schedule.rules_reload.map(|d| d.as_secs()),
        "Monitor loop started"
    );

    let mut cycles = interval(schedule.cycle_interval);
    cycles.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Without reloading the timer still exists but its branch is disabled.
    let reload_enabled = schedule.rules_reload.is_some();
    let mut reloads = interval(schedule.rules_reload.unwrap_or(Duration::from_secs(3600)));
    reloads.set_missed_tick_behavior(MissedTickBehavior::Skip);
    reloads.tick().await;

    let mut signalled = *shutdown.borrow();
    while !signalled {
        tokio::select! {
            changed = shutdown.changed() => {
                signalled = changed.is_err() || *shutdown.borrow();
            }
            _ = reloads.tick(), if reload_enabled => {
                // A rejected reload is logged inside and keeps the old rules.
                if let Ok(count) = engine.reload_rules() {
                    debug!(rules = count, "Scheduled rule reload applied");
                }
            }
            _ = cycles.tick() => {
                let cycle = engine.run_cycle_now();
                tokio::pin!(cycle);
                let report = loop {
                    tokio::select! {
                        report = &mut cycle => break report,
                        changed = shutdown.changed(), if !signalled => {
                            if changed.is_err() || *shutdown.borrow() {
                                signalled = true;
                                engine.shutdown();
                            }
                        }
                    }
                };
                match report {
                    Ok(report) => on_cycle(&report),
                    Err(e) => warn!(error = %e, "Cycle failed"),
                }
            }
        }
    }

    engine.shutdown();
    info!("Monitor loop stopped");
    Ok(())
}
