//! Tickwatch - portfolio price-threshold monitoring.
//!
//! Watches a portfolio of tickers against per-ticker buy/sell limits and
//! notifies once per crossing. A fired alert re-arms only after the price
//! returns inside the band between the limits, so a price parked beyond a
//! limit does not produce repeated notifications.
//!
//! # Architecture
//!
//! - [`domain`] - Tickers, threshold rules, the alert state machine and the
//!   trading outlook. Pure, no I/O.
//! - [`port`] - Traits for price providers, notification transports and
//!   stores, plus the [`MonitorApi`](port::MonitorApi) operations.
//! - [`application`] - Rule book, price cache, alert tracker, dispatcher and
//!   the cycle orchestrator behind [`Engine`](application::Engine).
//! - [`adapter`] - Yahoo/Finnhub fetchers, Telegram and log transports,
//!   JSON stores and the CLI.
//! - [`infrastructure`] - Configuration, wiring and the long-running loop.
//!
//! # Features
//!
//! - `telegram` (default) - Telegram notification transport.
//!
//! # Example
//!
//! ```no_run
//! use tickwatch::infrastructure::bootstrap::build_engine;
//! use tickwatch::infrastructure::config::{Config, Secrets};
//! use tickwatch::port::MonitorApi;
//!
//! # async fn demo() -> tickwatch::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let secrets = Secrets::from_env(&config)?;
//! let engine = build_engine(&config, &secrets).await?;
//! engine.add_ticker("aapl").await?;
//! let report = engine.run_cycle_now().await?;
//! println!("{} alert(s)", report.alerts.len());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;
