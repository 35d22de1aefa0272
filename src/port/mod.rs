//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! Outbound ports are implemented by adapters that reach external systems;
//! the inbound port is what the request-handling shell calls.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │   CLI (inbound adapter) │
//!                    └────────────┬────────────┘
//!                                 │ MonitorApi
//!                    ┌────────────▼────────────┐
//!                    │  Application + Domain   │
//!                    └────────────┬────────────┘
//!     ┌───────────────────────────┼─────────────────────────────┐
//!     ▼                           ▼                             ▼
//! ┌──────────────┐        ┌───────────────┐             ┌──────────────┐
//! │ PriceFetcher │        │ Portfolio/Rule│             │ Notification │
//! │   Adapter    │        │ store Adapter │             │  Transport   │
//! └──────────────┘        └───────────────┘             └──────────────┘
//! ```

pub mod inbound;
pub mod outbound;

pub use inbound::monitor::{AlertStatus, CycleReport, MonitorApi, OutlookReport, PortfolioChange};
pub use outbound::notifier::NotificationTransport;
pub use outbound::price::{FetchedPrice, PriceFetcher};
pub use outbound::store::{PortfolioRepository, RuleSource};
