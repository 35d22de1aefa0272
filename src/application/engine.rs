//! Engine facade implementing [`MonitorApi`].

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{info, instrument};

use crate::application::context::MonitorContext;
use crate::application::dispatch::Notification;
use crate::application::monitor::{CycleSettings, Monitor};
use crate::domain::alert::AlertState;
use crate::domain::outlook::outlook;
use crate::domain::portfolio::PortfolioEntry;
use crate::domain::ticker::Ticker;
use crate::error::{Error, Result};
use crate::port::inbound::monitor::{
    AlertStatus, CycleReport, MonitorApi, OutlookReport, PortfolioChange,
};

/// The monitoring engine.
pub struct Engine {
    ctx: MonitorContext,
    monitor: Monitor,
    /// Held for the duration of a cycle so scheduled and on-demand cycles
    /// never overlap.
    cycle: Mutex<()>,
    shutdown: watch::Sender<bool>,
}

impl Engine {
    #[must_use]
    pub fn new(ctx: MonitorContext, settings: CycleSettings) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            monitor: Monitor::new(ctx.clone(), settings),
            ctx,
            cycle: Mutex::new(()),
            shutdown,
        }
    }

    #[must_use]
    pub const fn context(&self) -> &MonitorContext {
        &self.ctx
    }

    /// Cancel any running cycle and refuse new ones.
    pub fn shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            info!("Engine shutting down");
        }
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn status(&self, ticker: Ticker, state: Option<AlertState>) -> AlertStatus {
        let cached = self.ctx.cache.status(&ticker);
        let snapshot = cached.snapshot;
        let state = state.unwrap_or_else(|| AlertState::new(ticker.clone(), true));

        AlertStatus {
            direction: state.direction,
            last_fired_at: state.last_fired_at,
            fired_price: state.fired_price,
            last_price: state
                .last_price
                .or_else(|| snapshot.as_ref().map(|s| s.price)),
            price_fetched_at: snapshot.as_ref().map(|s| s.fetched_at),
            stale: cached.stale,
            ticker,
        }
    }
}

#[async_trait]
impl MonitorApi for Engine {
    #[instrument(skip(self))]
    async fn add_ticker(&self, ticker: &str) -> Result<PortfolioChange> {
        let ticker = Ticker::parse(ticker)?;
        let changed = self.ctx.portfolio.add(ticker.clone()).await?;
        Ok(PortfolioChange {
            ticker,
            changed,
            tickers: self.ctx.portfolio.tickers().await,
        })
    }

    #[instrument(skip(self))]
    async fn remove_ticker(&self, ticker: &str) -> Result<PortfolioChange> {
        let ticker = Ticker::parse(ticker)?;
        let changed = self.ctx.portfolio.remove(&ticker).await?;
        if changed {
            self.ctx.tracker.persist().await;
        }
        Ok(PortfolioChange {
            ticker,
            changed,
            tickers: self.ctx.portfolio.tickers().await,
        })
    }

    async fn list_portfolio(&self) -> Vec<PortfolioEntry> {
        self.ctx.portfolio.list().await
    }

    async fn check_alerts(&self, ticker: Option<&str>) -> Result<Vec<AlertStatus>> {
        let Some(raw) = ticker else {
            return Ok(self
                .ctx
                .tracker
                .fired()
                .into_iter()
                .map(|state| self.status(state.ticker.clone(), Some(state)))
                .collect());
        };

        let ticker = Ticker::parse(raw)?;
        if !self.ctx.portfolio.contains(&ticker).await {
            return Err(Error::NotTracked(ticker));
        }
        let state = self.ctx.tracker.get(&ticker);
        Ok(vec![self.status(ticker, state)])
    }

    async fn run_cycle_now(&self) -> Result<CycleReport> {
        let _cycle = self.cycle.lock().await;
        Ok(self.monitor.run_cycle(self.shutdown.subscribe()).await)
    }

    #[instrument(skip(self))]
    async fn trading_outlook(&self, ticker: &str, send: bool) -> Result<OutlookReport> {
        let ticker = Ticker::parse(ticker)?;
        let rule = self
            .ctx
            .rules
            .rule(&ticker)
            .ok_or_else(|| Error::NoRule(ticker.clone()))?;
        let cached = self.ctx.cache.get(&ticker).await?;
        let outlook = outlook(&rule, cached.snapshot.price);

        let dispatched = if send {
            let delivery = self
                .ctx
                .dispatcher
                .dispatch(&Notification::Outlook(outlook.clone()))
                .await;
            Some(delivery.is_delivered())
        } else {
            None
        };

        Ok(OutlookReport {
            outlook,
            stale: cached.stale,
            dispatched,
        })
    }

    fn reload_rules(&self) -> Result<usize> {
        Ok(self.ctx.rules.reload()?)
    }
}
