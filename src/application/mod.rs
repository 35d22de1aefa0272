//! Application services (use cases).
//!
//! These services hold the engine's state and coordinate the outbound
//! ports to implement monitoring. [`engine::Engine`] is the single entry
//! point the inbound adapters talk to.

pub mod cache;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod format;
pub mod limiter;
pub mod monitor;
pub mod portfolio;
pub mod rules;
pub mod tracker;

pub use context::MonitorContext;
pub use dispatch::{DispatchResult, Dispatcher, Notification, RetryPolicy};
pub use engine::Engine;
pub use monitor::{CycleSettings, DispatchMode, Monitor};
