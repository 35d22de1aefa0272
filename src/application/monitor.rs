//! Monitoring cycle.
//!
//! One cycle walks the portfolio: resolve the rule, get a price through the
//! cache, evaluate and commit under the tracker, then dispatch. Tickers run
//! concurrently on a bounded pool, each under its own deadline, and a
//! failure in one ticker never reaches another.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::application::context::MonitorContext;
use crate::application::dispatch::{DispatchResult, Notification};
use crate::application::format::DEFAULT_SUMMARY_HEADER;
use crate::domain::alert::{AlertEvent, Verdict};
use crate::domain::rule::ThresholdRule;
use crate::domain::ticker::Ticker;
use crate::error::DispatchError;
use crate::port::inbound::monitor::CycleReport;

/// How a cycle's events reach the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchMode {
    /// One message per event, sent from the ticker's own task.
    PerEvent,
    /// One combined message after every ticker finished.
    Summary { header: String },
}

impl Default for DispatchMode {
    fn default() -> Self {
        Self::Summary {
            header: DEFAULT_SUMMARY_HEADER.to_string(),
        }
    }
}

/// Cycle tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSettings {
    /// Tickers processed at once.
    pub workers: usize,
    /// Deadline for one ticker's fetch, evaluation and dispatch.
    pub ticker_timeout: Duration,
    pub mode: DispatchMode,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            ticker_timeout: Duration::from_secs(10),
            mode: DispatchMode::default(),
        }
    }
}

#[derive(Debug)]
enum Status {
    Evaluated,
    Unavailable,
    /// Removed from the portfolio while in flight.
    Removed,
    TimedOut,
}

#[derive(Debug)]
struct TickerOutcome {
    ticker: Ticker,
    status: Status,
    event: Option<AlertEvent>,
    delivery: Option<DispatchResult>,
}

impl TickerOutcome {
    const fn new(ticker: Ticker, status: Status) -> Self {
        Self {
            ticker,
            status,
            event: None,
            delivery: None,
        }
    }
}

/// Runs monitoring cycles over a [`MonitorContext`].
pub struct Monitor {
    ctx: MonitorContext,
    settings: CycleSettings,
}

impl Monitor {
    #[must_use]
    pub fn new(ctx: MonitorContext, settings: CycleSettings) -> Self {
        Self { ctx, settings }
    }

    /// Run one cycle. Flipping `cancel` to true aborts tickers still in
    /// flight; whatever they already committed stays committed.
    pub async fn run_cycle(&self, mut cancel: watch::Receiver<bool>) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport {
            started_at: Some(Utc::now()),
            ..CycleReport::default()
        };

        if *cancel.borrow() {
            report.cancelled = true;
            return report;
        }

        // Rules are pinned for the whole cycle; a reload affects the next one.
        let rules = self.ctx.rules.snapshot();
        let tickers = self.ctx.portfolio.tickers().await;
        let workers = Arc::new(Semaphore::new(self.settings.workers.max(1)));
        let mut tasks = JoinSet::new();

        for ticker in tickers {
            let Some(rule) = rules.get(&ticker).cloned() else {
                debug!(ticker = %ticker, "No threshold rule, skipping");
                report.skipped_no_rule.push(ticker);
                continue;
            };

            let ctx = self.ctx.clone();
            let workers = Arc::clone(&workers);
            let ticker_timeout = self.settings.ticker_timeout;
            let dispatch_inline = self.settings.mode == DispatchMode::PerEvent;

            tasks.spawn(async move {
                let Ok(_permit) = workers.acquire_owned().await else {
                    return TickerOutcome::new(ticker, Status::TimedOut);
                };
                let deadline = deadline_after(ticker_timeout);
                process_ticker(&ctx, rule, deadline, dispatch_inline).await
            });
        }

        let mut watching = true;
        loop {
            tokio::select! {
                biased;
                changed = cancel.changed(), if watching => {
                    match changed {
                        Ok(()) if *cancel.borrow() => {
                            warn!(in_flight = tasks.len(), "Cycle cancelled");
                            tasks.abort_all();
                            report.cancelled = true;
                        }
                        Ok(()) => {}
                        Err(_) => watching = false,
                    }
                    if report.cancelled {
                        watching = false;
                    }
                }
                joined = tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    match joined {
                        Ok(outcome) => record(&mut report, outcome),
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => warn!(error = %e, "Ticker task failed"),
                    }
                }
            }
        }

        report.unavailable.sort();
        report.timed_out.sort();
        report.alerts.sort_by(|a, b| a.ticker.cmp(&b.ticker));

        // Committed states are saved before anything is sent.
        self.ctx.tracker.persist().await;

        if let DispatchMode::Summary { header } = &self.settings.mode {
            if !report.alerts.is_empty() {
                let notification = Notification::Batch {
                    header: header.clone(),
                    events: report.alerts.clone(),
                };
                let delivery = self
                    .dispatch_summary(&notification, &mut cancel, watching, &mut report)
                    .await;
                record_delivery(&mut report, &delivery);
            }
        }

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            evaluated = report.evaluated,
            alerts = report.alerts.len(),
            skipped = report.skipped_no_rule.len(),
            unavailable = report.unavailable.len(),
            timed_out = report.timed_out.len(),
            delivered = report.delivered,
            dispatch_failures = report.dispatch_failures,
            cancelled = report.cancelled,
            duration_ms = report.duration_ms,
            "Cycle complete"
        );
        report
    }
}

impl Monitor {
    /// Send the cycle's summary within one ticker deadline. A cancellation
    /// arriving meanwhile abandons the send.
    async fn dispatch_summary(
        &self,
        notification: &Notification,
        cancel: &mut watch::Receiver<bool>,
        mut watching: bool,
        report: &mut CycleReport,
    ) -> DispatchResult {
        let deadline = deadline_after(self.settings.ticker_timeout);
        let dispatch = timeout_at(deadline, self.ctx.dispatcher.dispatch(notification));
        tokio::pin!(dispatch);

        loop {
            tokio::select! {
                delivered = &mut dispatch => {
                    return delivered.unwrap_or_else(|_| {
                        warn!(events = report.alerts.len(), "Summary dispatch timed out");
                        undelivered("dispatch timed out")
                    });
                }
                changed = cancel.changed(), if watching => match changed {
                    Ok(()) if *cancel.borrow() => {
                        warn!(events = report.alerts.len(), "Cycle cancelled during summary dispatch");
                        report.cancelled = true;
                        return undelivered("dispatch cancelled");
                    }
                    Ok(()) => {}
                    Err(_) => watching = false,
                },
            }
        }
    }
}

/// `timeout` from now, saturating instead of overflowing the clock.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(Duration::from_secs(86_400)))
        .unwrap_or(now)
}

fn undelivered(reason: &str) -> DispatchResult {
    DispatchResult::Failed {
        attempts: 0,
        error: DispatchError::Transient(reason.to_string()),
    }
}

async fn process_ticker(
    ctx: &MonitorContext,
    rule: ThresholdRule,
    deadline: Instant,
    dispatch_inline: bool,
) -> TickerOutcome {
    let ticker = rule.ticker().clone();

    let evaluated = timeout_at(deadline, evaluate_ticker(ctx, &rule)).await;
    let mut outcome = match evaluated {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(ticker = %ticker, "Ticker timed out");
            return TickerOutcome::new(ticker, Status::TimedOut);
        }
    };

    if dispatch_inline {
        if let Some(event) = outcome.event.clone() {
            let delivery = timeout_at(deadline, ctx.dispatcher.dispatch(&Notification::Alert(event)))
                .await
                .unwrap_or_else(|_| {
                    warn!(ticker = %ticker, "Dispatch timed out");
                    undelivered("dispatch timed out")
                });
            outcome.delivery = Some(delivery);
        }
    }

    outcome
}

async fn evaluate_ticker(ctx: &MonitorContext, rule: &ThresholdRule) -> TickerOutcome {
    let ticker = rule.ticker().clone();

    let cached = match ctx.cache.get(&ticker).await {
        Ok(cached) => cached,
        Err(e) => {
            warn!(ticker = %ticker, error = %e, "Price unavailable, skipping this cycle");
            return TickerOutcome::new(ticker, Status::Unavailable);
        }
    };

    let price = cached.snapshot.price;
    let now = Utc::now();
    let committed = ctx
        .portfolio
        .commit_if_tracked(&ticker, || ctx.tracker.apply(rule, price, now))
        .await;

    match committed {
        None => {
            debug!(ticker = %ticker, "Ticker removed mid-cycle, discarding evaluation");
            TickerOutcome::new(ticker, Status::Removed)
        }
        Some(Verdict::NewAlert(event)) => {
            info!(
                ticker = %ticker,
                direction = %event.direction,
                price = %event.price,
                threshold = %event.threshold,
                stale = cached.stale,
                "Alert triggered"
            );
            let mut outcome = TickerOutcome::new(ticker, Status::Evaluated);
            outcome.event = Some(event);
            outcome
        }
        Some(_) => {
            debug!(ticker = %ticker, price = %price, "Evaluated");
            TickerOutcome::new(ticker, Status::Evaluated)
        }
    }
}

fn record(report: &mut CycleReport, outcome: TickerOutcome) {
    match outcome.status {
        Status::Evaluated => report.evaluated += 1,
        Status::Unavailable => report.unavailable.push(outcome.ticker),
        Status::TimedOut => report.timed_out.push(outcome.ticker),
        Status::Removed => {}
    }
    if let Some(event) = outcome.event {
        report.alerts.push(event);
    }
    if let Some(delivery) = &outcome.delivery {
        record_delivery(report, delivery);
    }
}

fn record_delivery(report: &mut CycleReport, delivery: &DispatchResult) {
    if delivery.is_delivered() {
        report.delivered += 1;
    } else {
        report.dispatch_failures += 1;
        if delivery.is_escalation() {
            report.escalations += 1;
        }
    }
}
